//! SDK configuration

use crate::engine::AdaptiveTrackSelectionFactory;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// User agent sent by SDK HTTP clients
pub const CLIENT_TAG: &str = concat!("kino-sdk/", env!("CARGO_PKG_VERSION"));

/// Top-level SDK configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    pub track_selection: TrackSelectionConfig,
    pub connection_pool: ConnectionPoolConfig,
    pub analytics: AnalyticsConfig,
}

impl SdkConfig {
    /// Parse from a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SdkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.track_selection.validate()?;
        self.connection_pool.validate()?;
        self.analytics.validate()
    }
}

/// Track selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSelectionConfig {
    /// Offer adaptive (auto quality) tracks
    pub adaptive_enabled: bool,
    /// Parameters handed to the engine for adaptive overrides
    pub adaptive: AdaptiveTrackSelectionFactory,
}

impl Default for TrackSelectionConfig {
    fn default() -> Self {
        Self {
            adaptive_enabled: true,
            adaptive: AdaptiveTrackSelectionFactory::default(),
        }
    }
}

impl TrackSelectionConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        let fraction = self.adaptive.bandwidth_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "track_selection.adaptive.bandwidth_fraction must be in (0, 1], got {}",
                fraction
            )));
        }
        Ok(())
    }
}

/// HTTP connection pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionPoolConfig {
    /// Idle connections kept per host
    pub max_idle_connections: usize,
    /// Idle connection keep-alive in seconds
    pub keep_alive_secs: u64,
    /// Requests sent to each host during warm-up
    pub warmup_times: usize,
    /// Overall warm-up deadline in milliseconds
    pub warmup_timeout_ms: u64,
    /// Path requested on each warm-up host
    pub warmup_path: String,
    /// Responses larger than this are not drained
    pub max_drain_bytes: u64,
    pub user_agent: String,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            keep_alive_secs: 5 * 60,
            warmup_times: 2,
            warmup_timeout_ms: 6_000,
            warmup_path: "/playkit-warmup".to_string(),
            max_drain_bytes: 10_000_000,
            user_agent: CLIENT_TAG.to_string(),
        }
    }
}

impl ConnectionPoolConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn warmup_timeout(&self) -> Duration {
        Duration::from_millis(self.warmup_timeout_ms)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.warmup_path.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "connection_pool.warmup_path must start with '/', got '{}'",
                self.warmup_path
            )));
        }
        if self.user_agent.is_empty() {
            return Err(Error::InvalidConfig("connection_pool.user_agent is empty".into()));
        }
        Ok(())
    }
}

/// Analytics plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    /// Events buffered before a flush
    pub max_buffer_size: usize,
    /// Endpoint receiving flushed events
    pub beacon_url: Option<url::Url>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_buffer_size: 50,
            beacon_url: None,
        }
    }
}

impl AnalyticsConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_buffer_size == 0 {
            return Err(Error::InvalidConfig("analytics.max_buffer_size must be > 0".into()));
        }
        Ok(())
    }
}
