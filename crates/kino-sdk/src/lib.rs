//! Kino SDK - Playback SDK layer for Kino
//!
//! This crate sits between an application and an adaptive-streaming engine:
//! - Track selection: stable track ids, adaptive (auto quality) tracks,
//!   selection overrides pushed back to the engine
//! - Ad cue point bookkeeping and the ad controller surface
//! - Plugin lifecycle with an analytics plugin
//! - HTTP connection pool and CDN warm-up
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Kino SDK                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   Snapshot   │  │   Track Id   │  │    Switch    │           │
//! │  │   Builder    │  │    Codec     │  │   Resolver   │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                  ┌────────┴────────┐                            │
//! │                  │ Track Selection │◄──── Engine TrackSelector  │
//! │                  │     Helper      │                            │
//! │                  └────────┬────────┘                            │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │   Plugins /  │  │     Ad      │  │  Connection  │            │
//! │  │  Analytics   │  │ Cue Points  │  │  Pool Warmup │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod ads;
pub mod config;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod tracks;
pub mod types;

#[cfg(feature = "analytics")]
pub mod analytics;
#[cfg(feature = "warmup")]
pub mod warmup;

pub use ads::{AdController, AdCuePoints};
pub use config::{AnalyticsConfig, ConnectionPoolConfig, SdkConfig, TrackSelectionConfig};
pub use engine::{
    AdaptiveSupport, AdaptiveTrackSelectionFactory, DefaultTrackSelector,
    FixedTrackSelectionFactory, Format, FormatSupport, MappedTrackInfo, RendererTracks,
    SelectionOverride, TrackGroup, TrackGroupArray, TrackSelectionFactory, TrackSelector,
};
pub use error::{Error, Result};
pub use plugin::{PlayerEvent, Plugin, PluginContext, PluginFactory, PluginRegistry};
pub use tracks::{TrackId, TrackIndex, TrackSelectionHelper, TracksReadyListener};
pub use types::*;

#[cfg(feature = "analytics")]
pub use analytics::{AnalyticsEventRecord, AnalyticsPlugin, AnalyticsPluginFactory};
#[cfg(feature = "warmup")]
pub use warmup::{ConnectionPoolManager, WarmUpReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the SDK
pub fn init() {
    tracing::info!(version = VERSION, "Kino SDK initialized");
}
