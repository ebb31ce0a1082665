//! Plugin lifecycle
//!
//! Plugins are created by a [`PluginFactory`] registered under a unique name,
//! loaded against a player, fed [`PlayerEvent`]s while the player runs, and
//! released when it shuts down.
//!
//! ```text
//!  register(factory) ──► load(name) ──► on_event(..)* ──► release()
//! ```

use crate::ads::AdCuePoints;
use crate::config::SdkConfig;
use crate::error::{Error, Result};
use crate::tracks::TrackId;
use crate::types::{SessionId, TracksSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Events a player forwards to its plugins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// A new tracks snapshot was published
    TracksAvailable {
        generation: u64,
        video: usize,
        audio: usize,
        text: usize,
    },

    /// The application switched tracks
    TrackChanged {
        unique_id: String,
        adaptive: bool,
    },

    /// Ad plugin reported its break positions
    AdCuePointsLoaded {
        cue_points: AdCuePoints,
    },

    /// Error surfaced to the application
    Error {
        code: String,
        message: String,
    },
}

impl PlayerEvent {
    pub fn tracks_available(snapshot: &TracksSnapshot) -> Self {
        PlayerEvent::TracksAvailable {
            generation: snapshot.generation,
            video: snapshot.video.len(),
            audio: snapshot.audio.len(),
            text: snapshot.text.len(),
        }
    }

    pub fn track_changed(id: &TrackId) -> Self {
        PlayerEvent::TrackChanged {
            unique_id: id.to_string(),
            adaptive: id.is_adaptive(),
        }
    }

    pub fn error(error: &Error) -> Self {
        PlayerEvent::Error {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }

    /// Event name as used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::TracksAvailable { .. } => "tracks_available",
            PlayerEvent::TrackChanged { .. } => "track_changed",
            PlayerEvent::AdCuePointsLoaded { .. } => "ad_cue_points_loaded",
            PlayerEvent::Error { .. } => "error",
        }
    }
}

/// What a plugin gets to see of the player when it is loaded
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub session_id: SessionId,
    pub config: Arc<SdkConfig>,
}

impl PluginContext {
    pub fn new(config: SdkConfig) -> Self {
        Self {
            session_id: SessionId::new(),
            config: Arc::new(config),
        }
    }
}

/// A player plugin
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Registered plugin name
    fn name(&self) -> &str;

    async fn load(&mut self, ctx: &PluginContext) -> Result<()>;

    async fn on_event(&mut self, event: &PlayerEvent);

    async fn release(&mut self);
}

/// Creates plugin instances
pub trait PluginFactory: Send + Sync {
    fn name(&self) -> &'static str;

    fn new_instance(&self) -> Box<dyn Plugin>;
}

/// Registered factories and loaded plugins of one player
#[derive(Default)]
pub struct PluginRegistry {
    factories: Vec<Arc<dyn PluginFactory>>,
    loaded: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under its name
    pub fn register(&mut self, factory: Arc<dyn PluginFactory>) -> Result<()> {
        let name = factory.name();
        if self.factories.iter().any(|f| f.name() == name) {
            return Err(Error::DuplicatePlugin(name.to_string()));
        }
        debug!(plugin = name, "Plugin factory registered");
        self.factories.push(factory);
        Ok(())
    }

    /// Names of registered factories, in registration order
    pub fn registered(&self) -> Vec<&'static str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    /// Names of loaded plugins, in load order
    pub fn loaded(&self) -> Vec<&str> {
        self.loaded.iter().map(|p| p.name()).collect()
    }

    /// Instantiate and load a registered plugin
    pub async fn load(&mut self, name: &str, ctx: &PluginContext) -> Result<()> {
        let factory = self
            .factories
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::UnknownPlugin(name.to_string()))?;

        let mut plugin = factory.new_instance();
        plugin.load(ctx).await?;

        info!(plugin = name, session_id = %ctx.session_id, "Plugin loaded");
        self.loaded.push(plugin);
        Ok(())
    }

    /// Forward an event to every loaded plugin in load order
    pub async fn dispatch(&mut self, event: &PlayerEvent) {
        for plugin in self.loaded.iter_mut() {
            plugin.on_event(event).await;
        }
    }

    /// Release loaded plugins, last loaded first
    pub async fn release_all(&mut self) {
        while let Some(mut plugin) = self.loaded.pop() {
            debug!(plugin = plugin.name(), "Releasing plugin");
            plugin.release().await;
        }
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        if !self.loaded.is_empty() {
            warn!(count = self.loaded.len(), "Plugin registry dropped with loaded plugins");
        }
    }
}
