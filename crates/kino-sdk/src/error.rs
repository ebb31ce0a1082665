//! Error types for Kino SDK

use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// SDK error types
#[derive(Error, Debug)]
pub enum Error {
    // Track selection errors
    #[error("Malformed track id '{id}': {reason}")]
    MalformedTrackId { id: String, reason: String },

    #[error("Track id '{id}' does not match the current track mapping")]
    StaleTrackId { id: String },

    #[error("Adaptive selection is not available for '{id}'")]
    AdaptiveNotSupported { id: String },

    #[error("No track mapping available from the engine")]
    NoTrackMapping,

    #[error("Track selection helper was released")]
    Released,

    // Plugin errors
    #[error("Plugin already registered: {0}")]
    DuplicatePlugin(String),

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Plugin '{name}' failed: {reason}")]
    PluginFailed { name: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed track id error
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedTrackId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error is recoverable
    ///
    /// A stale id is recovered by re-reading the published snapshot.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::StaleTrackId { .. } | Error::NoTrackMapping | Error::Network(_)
        )
    }

    /// Returns the error code for analytics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MalformedTrackId { .. } => "MALFORMED_TRACK_ID",
            Error::StaleTrackId { .. } => "STALE_TRACK_ID",
            Error::AdaptiveNotSupported { .. } => "ADAPTIVE_UNSUPPORTED",
            Error::NoTrackMapping => "NO_TRACK_MAPPING",
            Error::Released => "RELEASED",
            Error::DuplicatePlugin(_) => "DUPLICATE_PLUGIN",
            Error::UnknownPlugin(_) => "UNKNOWN_PLUGIN",
            Error::PluginFailed { .. } => "PLUGIN_FAILED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Network(_) => "NETWORK",
            Error::Io(_) => "IO",
        }
    }
}
