//! Track switch resolution
//!
//! Turns a [`TrackId`] into the [`SelectionOverride`] the engine understands
//! and applies it.

use super::id::{TrackId, TrackIndex};
use crate::engine::{MappedTrackInfo, SelectionOverride, TrackSelectionFactory, TrackSelector};
use crate::error::{Error, Result};
use crate::types::TracksSnapshot;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds overrides against one published snapshot
pub struct TrackSwitchResolver<'a> {
    snapshot: &'a TracksSnapshot,
    fixed_factory: &'a Arc<dyn TrackSelectionFactory>,
    adaptive_factory: Option<&'a Arc<dyn TrackSelectionFactory>>,
}

impl<'a> TrackSwitchResolver<'a> {
    pub fn new(
        snapshot: &'a TracksSnapshot,
        fixed_factory: &'a Arc<dyn TrackSelectionFactory>,
        adaptive_factory: Option<&'a Arc<dyn TrackSelectionFactory>>,
    ) -> Self {
        Self {
            snapshot,
            fixed_factory,
            adaptive_factory,
        }
    }

    /// Override for a track id
    ///
    /// `None` means the adaptive group has no physical track left in the
    /// snapshot, in which case the renderer's overrides should be cleared.
    pub fn resolve(&self, id: &TrackId) -> Result<Option<SelectionOverride>> {
        match id.track_index {
            TrackIndex::Track(track_index) => Ok(Some(SelectionOverride::new(
                Arc::clone(self.fixed_factory),
                id.group_index,
                vec![track_index],
            ))),
            TrackIndex::Adaptive => {
                let factory = self
                    .adaptive_factory
                    .ok_or_else(|| Error::AdaptiveNotSupported { id: id.to_string() })?;

                let tracks = self.adaptive_siblings(id);
                if tracks.is_empty() {
                    warn!(track_id = %id, "Adaptive group has no playable tracks");
                    return Ok(None);
                }

                Ok(Some(SelectionOverride::new(
                    Arc::clone(factory),
                    id.group_index,
                    tracks,
                )))
            }
        }
    }

    /// Physical track indices published for the id's group
    ///
    /// Matches on the adaptive flag, so the position of the adaptive entry
    /// in the list does not matter.
    pub fn adaptive_siblings(&self, id: &TrackId) -> Vec<usize> {
        self.snapshot
            .entries(id.renderer)
            .into_iter()
            .filter(|(entry, adaptive)| !adaptive && entry.group_index == id.group_index)
            .filter_map(|(entry, _)| entry.track_index.physical())
            .collect()
    }
}

/// Check that an id still addresses the engine's current mapping
pub fn ensure_in_mapping(mapping: &MappedTrackInfo, id: &TrackId) -> Result<()> {
    let groups = mapping.track_groups(id.renderer.index());
    let group = groups
        .get(id.group_index)
        .ok_or_else(|| Error::StaleTrackId { id: id.to_string() })?;

    match id.track_index {
        TrackIndex::Track(track_index) if track_index >= group.len() => {
            Err(Error::StaleTrackId { id: id.to_string() })
        }
        _ => Ok(()),
    }
}

/// Push an override to the engine for the id's renderer
pub fn apply_override(
    selector: &dyn TrackSelector,
    mapping: &MappedTrackInfo,
    renderer_index: usize,
    selection: Option<SelectionOverride>,
) {
    // keep whatever disabled state the application chose
    let disabled = selector.renderer_disabled(renderer_index);
    selector.set_renderer_disabled(renderer_index, disabled);

    match selection {
        Some(selection) => {
            debug!(
                renderer = renderer_index,
                selection = %selection,
                "Applying selection override"
            );
            selector.set_selection_override(
                renderer_index,
                mapping.track_groups(renderer_index),
                selection,
            );
        }
        None => {
            debug!(renderer = renderer_index, "Clearing selection overrides");
            selector.clear_selection_overrides(renderer_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AdaptiveTrackSelectionFactory, FixedTrackSelectionFactory};
    use crate::types::{RendererKind, VideoTrackInfo};

    fn video(id: TrackId, is_adaptive: bool) -> VideoTrackInfo {
        VideoTrackInfo {
            id,
            bitrate: 0,
            width: 0,
            height: 0,
            is_adaptive,
        }
    }

    fn factories() -> (Arc<dyn TrackSelectionFactory>, Arc<dyn TrackSelectionFactory>) {
        (
            Arc::new(FixedTrackSelectionFactory),
            Arc::new(AdaptiveTrackSelectionFactory::default()),
        )
    }

    #[test]
    fn test_siblings_ignore_entry_order() {
        let mut snapshot = TracksSnapshot::new(1);
        // adaptive entry deliberately not in slot 0
        snapshot.video.push(video(TrackId::track(RendererKind::Video, 0, 0), false));
        snapshot.video.push(video(TrackId::track(RendererKind::Video, 1, 0), false));
        snapshot.video.push(video(TrackId::adaptive(RendererKind::Video, 0), true));
        snapshot.video.push(video(TrackId::track(RendererKind::Video, 0, 2), false));

        let (fixed, adaptive) = factories();
        let resolver = TrackSwitchResolver::new(&snapshot, &fixed, Some(&adaptive));
        let selection = resolver
            .resolve(&TrackId::adaptive(RendererKind::Video, 0))
            .unwrap()
            .unwrap();
        assert!(selection.is_adaptive());
        assert_eq!(selection.tracks, vec![0, 2]);
    }

    #[test]
    fn test_adaptive_without_factory() {
        let snapshot = TracksSnapshot::new(1);
        let (fixed, _) = factories();
        let resolver = TrackSwitchResolver::new(&snapshot, &fixed, None);
        let err = resolver
            .resolve(&TrackId::adaptive(RendererKind::Audio, 0))
            .unwrap_err();
        assert!(matches!(err, Error::AdaptiveNotSupported { .. }));
    }

    #[test]
    fn test_empty_adaptive_group_clears() {
        let mut snapshot = TracksSnapshot::new(1);
        snapshot.video.push(video(TrackId::adaptive(RendererKind::Video, 0), true));
        let (fixed, adaptive) = factories();
        let resolver = TrackSwitchResolver::new(&snapshot, &fixed, Some(&adaptive));
        assert!(resolver
            .resolve(&TrackId::adaptive(RendererKind::Video, 0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_ensure_in_mapping() {
        use crate::engine::{AdaptiveSupport, Format, RendererTracks, TrackGroup};

        let mapping = MappedTrackInfo::new(vec![RendererTracks::default().with_handled_group(
            TrackGroup::new(vec![Format::video("v", 1, 1, 1)]),
            AdaptiveSupport::NotSupported,
        )]);
        assert!(ensure_in_mapping(&mapping, &TrackId::track(RendererKind::Video, 0, 0)).is_ok());
        assert!(ensure_in_mapping(&mapping, &TrackId::adaptive(RendererKind::Video, 0)).is_ok());
        assert!(ensure_in_mapping(&mapping, &TrackId::track(RendererKind::Video, 0, 1)).is_err());
        assert!(ensure_in_mapping(&mapping, &TrackId::track(RendererKind::Video, 1, 0)).is_err());
        assert!(ensure_in_mapping(&mapping, &TrackId::track(RendererKind::Audio, 0, 0)).is_err());
    }
}
