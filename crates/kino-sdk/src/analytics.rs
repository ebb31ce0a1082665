//! Analytics plugin
//!
//! Records every player event while monitoring:
//! - Track availability and track switches
//! - Ad cue points
//! - Errors surfaced to the application
//!
//! Records are buffered and flushed to an optional beacon endpoint.

use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::plugin::{PlayerEvent, Plugin, PluginContext, PluginFactory};
use crate::types::SessionId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Registered name of the analytics plugin
pub const ANALYTICS_PLUGIN_NAME: &str = "analytics";

/// Player event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEventRecord {
    /// Unique event ID
    pub id: Uuid,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    /// Sequence number within the session, starting at 1
    pub sequence: u64,
    #[serde(flatten)]
    pub event: PlayerEvent,
}

/// Analytics plugin
pub struct AnalyticsPlugin {
    session_id: SessionId,
    sequence: u64,
    buffer: Vec<AnalyticsEventRecord>,
    max_buffer_size: usize,
    beacon_url: Option<Url>,
    client: reqwest::Client,
    /// Set while monitoring; records are mirrored to the log task
    event_tx: Option<mpsc::Sender<AnalyticsEventRecord>>,
}

impl AnalyticsPlugin {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            session_id: SessionId::new(),
            sequence: 0,
            buffer: Vec::new(),
            max_buffer_size: config.max_buffer_size.max(1),
            beacon_url: config.beacon_url.clone(),
            client: reqwest::Client::new(),
            event_tx: None,
        }
    }

    /// Use the connection-pool client instead of a private one
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn is_monitoring(&self) -> bool {
        self.event_tx.is_some()
    }

    /// Start recording events for a session
    pub fn start_monitoring(&mut self, session_id: SessionId) {
        if self.is_monitoring() {
            return;
        }
        let (event_tx, mut event_rx) = mpsc::channel::<AnalyticsEventRecord>(1000);

        tokio::spawn(async move {
            while let Some(record) = event_rx.recv().await {
                debug!(
                    event_id = %record.id,
                    sequence = record.sequence,
                    event = record.event.name(),
                    "Analytics event"
                );
            }
        });

        self.session_id = session_id;
        self.sequence = 0;
        self.event_tx = Some(event_tx);
        info!(session_id = %session_id, "Analytics monitoring started");
    }

    /// Stop recording and flush what is buffered
    pub async fn stop_monitoring(&mut self) {
        if self.event_tx.take().is_none() {
            return;
        }
        let events: Vec<_> = self.buffer.drain(..).collect();
        self.flush_events(events).await;
        info!(session_id = %self.session_id, "Analytics monitoring stopped");
    }

    /// Record an event
    pub async fn record(&mut self, event: PlayerEvent) {
        let Some(event_tx) = self.event_tx.clone() else {
            return;
        };

        self.sequence += 1;
        let record = AnalyticsEventRecord {
            id: Uuid::new_v4(),
            session_id: self.session_id,
            timestamp: Utc::now(),
            sequence: self.sequence,
            event,
        };

        self.buffer.push(record.clone());
        if self.buffer.len() >= self.max_buffer_size {
            let events: Vec<_> = self.buffer.drain(..).collect();
            self.flush_events(events).await;
        }

        let _ = event_tx.send(record).await;
    }

    /// Buffered records not yet flushed
    pub fn events(&self) -> &[AnalyticsEventRecord] {
        &self.buffer
    }

    async fn flush_events(&self, events: Vec<AnalyticsEventRecord>) {
        if events.is_empty() {
            return;
        }

        info!(count = events.len(), "Flushing analytics events");

        // fire-and-forget beacon
        if let Some(ref url) = self.beacon_url {
            if let Err(e) = self.client.post(url.clone()).json(&events).send().await {
                warn!(error = %e, "Analytics beacon failed");
            }
        }
    }
}

#[async_trait]
impl Plugin for AnalyticsPlugin {
    fn name(&self) -> &str {
        ANALYTICS_PLUGIN_NAME
    }

    async fn load(&mut self, ctx: &PluginContext) -> Result<()> {
        let config = &ctx.config.analytics;
        if let Some(url) = &config.beacon_url {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::PluginFailed {
                    name: ANALYTICS_PLUGIN_NAME.to_string(),
                    reason: format!("unsupported beacon scheme '{}'", url.scheme()),
                });
            }
        }

        self.max_buffer_size = config.max_buffer_size.max(1);
        self.beacon_url = config.beacon_url.clone();
        if config.enabled {
            self.start_monitoring(ctx.session_id);
        }
        Ok(())
    }

    async fn on_event(&mut self, event: &PlayerEvent) {
        self.record(event.clone()).await;
    }

    async fn release(&mut self) {
        self.stop_monitoring().await;
    }
}

/// Factory registering [`AnalyticsPlugin`]
///
/// Plugins start from the factory's config. [`Plugin::load`] then applies the
/// analytics section of the player's [`PluginContext`].
#[derive(Debug, Clone, Default)]
pub struct AnalyticsPluginFactory {
    config: AnalyticsConfig,
    client: Option<reqwest::Client>,
}

impl AnalyticsPluginFactory {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Share an HTTP client with every created plugin
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Create a plugin that has not been loaded yet
    pub fn create(&self) -> AnalyticsPlugin {
        let plugin = AnalyticsPlugin::new(&self.config);
        match &self.client {
            Some(client) => plugin.with_client(client.clone()),
            None => plugin,
        }
    }
}

impl PluginFactory for AnalyticsPluginFactory {
    fn name(&self) -> &'static str {
        ANALYTICS_PLUGIN_NAME
    }

    fn new_instance(&self) -> Box<dyn Plugin> {
        Box::new(self.create())
    }
}
