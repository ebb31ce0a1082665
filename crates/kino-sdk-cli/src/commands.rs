//! CLI command implementations

use crate::output::{self, OutputFormat, SelectionView};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use kino_sdk::{
    AnalyticsPluginFactory, ConnectionPoolManager, DefaultTrackSelector, MappedTrackInfo,
    PlayerEvent, PluginContext, PluginRegistry, SdkConfig, TrackId, TrackSelectionHelper,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Load the SDK configuration, or the defaults without a file
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SdkConfig> {
    match path {
        Some(path) => SdkConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(SdkConfig::default()),
    }
}

/// Load an engine track mapping fixture
pub fn load_mapping(path: &Path) -> anyhow::Result<MappedTrackInfo> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid track mapping in {}", path.display()))
}

fn helper_for(
    mapping: MappedTrackInfo,
    config: &SdkConfig,
) -> (Arc<DefaultTrackSelector>, TrackSelectionHelper) {
    let selector = Arc::new(DefaultTrackSelector::with_mapping(mapping));
    let helper = TrackSelectionHelper::from_config(selector.clone(), &config.track_selection);
    (selector, helper)
}

/// List the tracks exposed for a mapping
pub fn tracks(mapping_path: &Path, config: &SdkConfig, format: &str) -> anyhow::Result<()> {
    let (_selector, mut helper) = helper_for(load_mapping(mapping_path)?, config);
    let snapshot = helper.prepare_snapshot()?;

    println!("{}", output::render_snapshot(&snapshot, OutputFormat::from(format))?);
    helper.release();
    Ok(())
}

/// Resolve a track change and print the applied override
pub async fn select(
    mapping_path: &Path,
    unique_id: &str,
    config: &SdkConfig,
    format: &str,
) -> anyhow::Result<()> {
    let (selector, mut helper) = helper_for(load_mapping(mapping_path)?, config);

    let mut plugins = PluginRegistry::new();
    if config.analytics.enabled {
        plugins.register(Arc::new(AnalyticsPluginFactory::new(config.analytics.clone())))?;
        plugins
            .load("analytics", &PluginContext::new(config.clone()))
            .await?;
    }

    let snapshot = helper.prepare_snapshot()?;
    plugins.dispatch(&PlayerEvent::tracks_available(&snapshot)).await;

    let outcome = TrackId::parse(unique_id)
        .and_then(|id| helper.change_track_id(&id).map(|selection| (id, selection)));
    let event = match &outcome {
        Ok((id, _)) => PlayerEvent::track_changed(id),
        Err(e) => PlayerEvent::error(e),
    };
    plugins.dispatch(&event).await;
    plugins.release_all().await;

    let (id, selection) = outcome.with_context(|| format!("Cannot switch to '{}'", unique_id))?;
    tracing::debug!(
        renderer = %id.renderer,
        applied = selector.selection_override(id.renderer.index()).is_some(),
        "Engine selector updated"
    );

    let view = SelectionView::new(unique_id, id.renderer, selection.as_ref());
    println!("{}", output::render_selection(&view, OutputFormat::from(format))?);
    helper.release();
    Ok(())
}

/// Warm up connections to CDN hosts
pub async fn warmup(hosts: &[String], config: &SdkConfig, format: &str) -> anyhow::Result<()> {
    let manager = ConnectionPoolManager::new(config.connection_pool.clone())
        .context("Failed to create connection pool")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Warming up {} host(s)...", hosts.len()));

    let report = manager.warm_up(hosts).await;
    spinner.finish_and_clear();

    println!("{}", output::render_report(&report, OutputFormat::from(format))?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/mapping.json")
    }

    #[test]
    fn test_fixture_mapping_loads() {
        let mapping = load_mapping(&fixture()).unwrap();
        let (_selector, mut helper) = helper_for(mapping, &SdkConfig::default());
        let snapshot = helper.prepare_snapshot().unwrap();

        assert_eq!(snapshot.video[0].unique_id(), "Video:0,0,adaptive");
        assert_eq!(snapshot.video.len(), 4);
        assert_eq!(snapshot.audio.len(), 3);
        assert_eq!(snapshot.text.len(), 2);
    }

    #[test]
    fn test_config_fixture() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/config.json");
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.track_selection.adaptive.bandwidth_fraction, 0.75);
        assert_eq!(config.analytics.max_buffer_size, 20);
        assert_eq!(config.connection_pool.max_idle_connections, 10);
    }

    #[test]
    fn test_missing_mapping_has_context() {
        let err = load_mapping(Path::new("/nonexistent/mapping.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read mapping"));
    }

    #[tokio::test]
    async fn test_select_against_fixture() {
        let mut config = SdkConfig::default();
        config.analytics.enabled = false;
        select(&fixture(), "Audio:1,0,adaptive", &config, "json").await.unwrap();
        assert!(select(&fixture(), "Audio:1,7,0", &config, "text").await.is_err());
    }
}
