//! Track selection
//!
//! [`TrackSelectionHelper`] sits between the application and the engine's
//! track selector:
//!
//! ```text
//!   engine mapping ──► SnapshotBuilder ──► TracksSnapshot ──► listener / caller
//!                                               │
//!   unique id ──► TrackId ──► TrackSwitchResolver ──► SelectionOverride ──► engine
//! ```

mod builder;
mod id;
mod resolver;

pub use builder::SnapshotBuilder;
pub use id::{TrackId, TrackIndex, ADAPTIVE_TOKEN};
pub use resolver::{apply_override, ensure_in_mapping, TrackSwitchResolver};

use crate::config::TrackSelectionConfig;
use crate::engine::{
    FixedTrackSelectionFactory, MappedTrackInfo, SelectionOverride, TrackSelectionFactory,
    TrackSelector,
};
use crate::error::{Error, Result};
use crate::types::{RendererKind, TracksSnapshot};
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument};

/// Receives every snapshot the helper publishes
pub trait TracksReadyListener: Send + Sync {
    fn on_tracks_ready(&self, snapshot: &TracksSnapshot);
}

/// Generates, holds and changes the selectable tracks of a player
pub struct TrackSelectionHelper {
    selector: Arc<dyn TrackSelector>,
    fixed_factory: Arc<dyn TrackSelectionFactory>,
    /// `None` disables adaptive entries
    adaptive_factory: Option<Arc<dyn TrackSelectionFactory>>,
    /// Mapping the current snapshot was built from
    mapping: Option<Arc<MappedTrackInfo>>,
    snapshot: Arc<TracksSnapshot>,
    generation: u64,
    listener: Option<Weak<dyn TracksReadyListener>>,
    released: bool,
}

impl TrackSelectionHelper {
    /// Create a helper over an engine selector
    ///
    /// Pass `None` as `adaptive_factory` if the player should not offer
    /// adaptive (auto quality) tracks.
    pub fn new(
        selector: Arc<dyn TrackSelector>,
        adaptive_factory: Option<Arc<dyn TrackSelectionFactory>>,
    ) -> Self {
        Self {
            selector,
            fixed_factory: Arc::new(FixedTrackSelectionFactory),
            adaptive_factory,
            mapping: None,
            snapshot: Arc::new(TracksSnapshot::default()),
            generation: 0,
            listener: None,
            released: false,
        }
    }

    /// Create a helper from configuration
    pub fn from_config(selector: Arc<dyn TrackSelector>, config: &TrackSelectionConfig) -> Self {
        let adaptive_factory = config
            .adaptive_enabled
            .then(|| Arc::new(config.adaptive.clone()) as Arc<dyn TrackSelectionFactory>);
        Self::new(selector, adaptive_factory)
    }

    /// Register the listener for new snapshots
    ///
    /// Only a weak reference is kept; dropping the listener unregisters it.
    pub fn set_tracks_ready_listener(&mut self, listener: &Arc<dyn TracksReadyListener>) {
        self.listener = Some(Arc::downgrade(listener));
    }

    /// Rebuild the snapshot from the engine's current mapping
    ///
    /// Called whenever the engine reports new tracks. Ids from previous
    /// snapshots must be discarded by the caller.
    #[instrument(skip(self))]
    pub fn prepare_snapshot(&mut self) -> Result<Arc<TracksSnapshot>> {
        self.ensure_active()?;

        let mapping = self.selector.current_mapping().ok_or(Error::NoTrackMapping)?;
        self.generation += 1;

        let builder = SnapshotBuilder::new(&mapping, self.adaptive_factory.is_some());
        let snapshot = Arc::new(builder.build(self.generation));

        self.mapping = Some(mapping);
        self.snapshot = Arc::clone(&snapshot);

        info!(
            generation = snapshot.generation,
            video = snapshot.video.len(),
            audio = snapshot.audio.len(),
            text = snapshot.text.len(),
            "Tracks ready"
        );

        if let Some(listener) = self.listener.as_ref().and_then(Weak::upgrade) {
            listener.on_tracks_ready(&snapshot);
        }

        Ok(snapshot)
    }

    /// Switch playback to the track with this unique id
    ///
    /// Returns the override handed to the engine, or `None` if the
    /// renderer's overrides were cleared instead.
    #[instrument(skip(self))]
    pub fn change_track(&mut self, unique_id: &str) -> Result<Option<SelectionOverride>> {
        info!(unique_id, "Change track");
        let id = TrackId::parse(unique_id)?;
        self.change_track_id(&id)
    }

    /// Switch playback to a decoded track id
    ///
    /// The id must come from the last published snapshot. If the engine's
    /// mapping was replaced since then, every id is stale until the next
    /// [`prepare_snapshot`](Self::prepare_snapshot).
    pub fn change_track_id(&mut self, id: &TrackId) -> Result<Option<SelectionOverride>> {
        self.ensure_active()?;

        let current = self.selector.current_mapping().ok_or(Error::NoTrackMapping)?;
        let mapping = self
            .mapping
            .as_ref()
            .filter(|mapping| Arc::ptr_eq(*mapping, &current))
            .ok_or_else(|| Error::StaleTrackId { id: id.to_string() })?;
        ensure_in_mapping(mapping, id)?;

        if id.is_adaptive() && !self.snapshot.contains(id) {
            return Err(Error::AdaptiveNotSupported { id: id.to_string() });
        }

        let resolver = TrackSwitchResolver::new(
            &self.snapshot,
            &self.fixed_factory,
            self.adaptive_factory.as_ref(),
        );
        let selection = resolver.resolve(id)?;

        debug!(track_id = %id, adaptive = id.is_adaptive(), "Track switch resolved");
        apply_override(
            self.selector.as_ref(),
            mapping,
            id.renderer.index(),
            selection.clone(),
        );

        Ok(selection)
    }

    /// Whether a group of the current mapping would get an adaptive entry
    pub fn is_adaptive(&self, renderer: RendererKind, group_index: usize) -> bool {
        let Some(mapping) = self.mapping.as_ref() else {
            return false;
        };
        mapping
            .track_groups(renderer.index())
            .get(group_index)
            .is_some_and(|group| {
                SnapshotBuilder::new(mapping, self.adaptive_factory.is_some())
                    .is_adaptive(renderer, group_index, group)
            })
    }

    /// Last published snapshot
    pub fn snapshot(&self) -> Arc<TracksSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Number of snapshots published so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Drop the listener and all tracks
    ///
    /// Safe to call more than once; the helper cannot be used afterwards.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.listener = None;
        self.mapping = None;
        Arc::make_mut(&mut self.snapshot).clear();
        self.released = true;
        debug!("Track selection helper released");
    }

    fn ensure_active(&self) -> Result<()> {
        if self.released {
            Err(Error::Released)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for TrackSelectionHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackSelectionHelper")
            .field("generation", &self.generation)
            .field("adaptive", &self.adaptive_factory.is_some())
            .field("tracks", &self.snapshot.len())
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        AdaptiveSupport, AdaptiveTrackSelectionFactory, DefaultTrackSelector, Format,
        RendererTracks, TrackGroup,
    };
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        generations: Arc<Mutex<Vec<u64>>>,
    }

    impl TracksReadyListener for Recorder {
        fn on_tracks_ready(&self, snapshot: &TracksSnapshot) {
            self.generations.lock().push(snapshot.generation);
        }
    }

    fn selector() -> Arc<DefaultTrackSelector> {
        let group = TrackGroup::new(vec![
            Format::video("v1", 800_000, 640, 360),
            Format::video("v2", 2_800_000, 1280, 720),
        ]);
        Arc::new(DefaultTrackSelector::with_mapping(MappedTrackInfo::new(vec![
            RendererTracks::default().with_handled_group(group, AdaptiveSupport::Seamless),
        ])))
    }

    fn helper(selector: Arc<DefaultTrackSelector>) -> TrackSelectionHelper {
        TrackSelectionHelper::new(
            selector,
            Some(Arc::new(AdaptiveTrackSelectionFactory::default())),
        )
    }

    #[test]
    fn test_listener_notified_once_per_prepare() {
        let mut helper = helper(selector());
        let recorder = Recorder::default();
        let generations = Arc::clone(&recorder.generations);
        let listener: Arc<dyn TracksReadyListener> = Arc::new(recorder);
        helper.set_tracks_ready_listener(&listener);

        helper.prepare_snapshot().unwrap();
        helper.prepare_snapshot().unwrap();
        assert_eq!(*generations.lock(), vec![1, 2]);
    }

    #[test]
    fn test_dropped_listener_not_notified() {
        let mut helper = helper(selector());
        let recorder = Recorder::default();
        let generations = Arc::clone(&recorder.generations);
        let listener: Arc<dyn TracksReadyListener> = Arc::new(recorder);
        helper.set_tracks_ready_listener(&listener);

        helper.prepare_snapshot().unwrap();
        drop(listener);
        helper.prepare_snapshot().unwrap();
        assert_eq!(*generations.lock(), vec![1]);
    }

    #[test]
    fn test_no_mapping() {
        let mut helper = TrackSelectionHelper::new(Arc::new(DefaultTrackSelector::new()), None);
        assert!(matches!(helper.prepare_snapshot(), Err(Error::NoTrackMapping)));
        assert!(matches!(helper.change_track("Video:0,0,0"), Err(Error::NoTrackMapping)));
    }

    #[test]
    fn test_release() {
        let mut helper = helper(selector());
        helper.prepare_snapshot().unwrap();
        assert!(helper.is_adaptive(RendererKind::Video, 0));

        helper.release();
        helper.release();
        assert!(helper.is_released());
        assert!(helper.snapshot().is_empty());
        assert!(!helper.is_adaptive(RendererKind::Video, 0));
        assert!(matches!(helper.prepare_snapshot(), Err(Error::Released)));
        assert!(matches!(helper.change_track("Video:0,0,0"), Err(Error::Released)));
    }

    #[test]
    fn test_stale_id_rejected() {
        let selector = selector();
        let mut helper = helper(selector.clone());
        helper.prepare_snapshot().unwrap();

        let err = helper.change_track("Video:0,4,0").unwrap_err();
        assert!(matches!(err, Error::StaleTrackId { .. }));
        assert!(selector.selection_override(0).is_none());
    }

    #[test]
    fn test_mapping_replaced_before_prepare() {
        let selector = selector();
        let mut helper = helper(selector.clone());
        helper.prepare_snapshot().unwrap();

        let single = TrackGroup::new(vec![Format::video("v1", 800_000, 640, 360)]);
        selector.set_mapping(MappedTrackInfo::new(vec![
            RendererTracks::default().with_handled_group(single, AdaptiveSupport::NotSupported),
        ]));

        let err = helper.change_track("Video:0,0,adaptive").unwrap_err();
        assert!(matches!(err, Error::StaleTrackId { .. }));
        assert!(matches!(
            helper.change_track("Video:0,0,0"),
            Err(Error::StaleTrackId { .. })
        ));
        assert!(selector.selection_override(0).is_none());
        assert!(helper.is_adaptive(RendererKind::Video, 0));

        helper.prepare_snapshot().unwrap();
        assert!(!helper.is_adaptive(RendererKind::Video, 0));
        assert!(matches!(
            helper.change_track("Video:0,0,adaptive"),
            Err(Error::AdaptiveNotSupported { .. })
        ));
        assert_eq!(
            helper.change_track("Video:0,0,0").unwrap(),
            Some(SelectionOverride::fixed(0, 0))
        );
    }

    #[test]
    fn test_adaptive_id_needs_capable_group() {
        let group = TrackGroup::new(vec![
            Format::video("v1", 800_000, 640, 360),
            Format::video("v2", 2_800_000, 1280, 720),
        ]);
        let selector = Arc::new(DefaultTrackSelector::with_mapping(MappedTrackInfo::new(vec![
            RendererTracks::default().with_handled_group(group, AdaptiveSupport::NotSupported),
        ])));
        let mut helper = helper(selector.clone());
        let snapshot = helper.prepare_snapshot().unwrap();
        assert!(snapshot.adaptive_track_ids().is_empty());

        let err = helper.change_track("Video:0,0,adaptive").unwrap_err();
        assert!(matches!(err, Error::AdaptiveNotSupported { .. }));
        assert!(selector.selection_override(0).is_none());
    }
}
