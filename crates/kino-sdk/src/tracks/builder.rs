//! Snapshot building from the engine mapping

use super::id::TrackId;
use crate::engine::{AdaptiveSupport, Format, FormatSupport, MappedTrackInfo, TrackGroup};
use crate::types::{AudioTrackInfo, RendererKind, TextTrackInfo, TracksSnapshot, VideoTrackInfo};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Turns a [`MappedTrackInfo`] into a [`TracksSnapshot`]
///
/// Unsupported tracks and tracks without a format id are filtered out. When
/// adaptive selection is enabled, every video/audio group with more than one
/// track and adaptive capability gets an extra adaptive entry placed before
/// the group's physical tracks.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder<'a> {
    mapping: &'a MappedTrackInfo,
    adaptive_enabled: bool,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(mapping: &'a MappedTrackInfo, adaptive_enabled: bool) -> Self {
        Self {
            mapping,
            adaptive_enabled,
        }
    }

    /// Build the snapshot for a prepare cycle
    pub fn build(&self, generation: u64) -> TracksSnapshot {
        let mut snapshot = TracksSnapshot::new(generation);
        let mut adaptive_groups: HashSet<(RendererKind, usize)> = HashSet::new();

        for renderer in RendererKind::ALL {
            let groups = self.mapping.track_groups(renderer.index());

            for (group_index, group) in groups.groups.iter().enumerate() {
                if self.is_adaptive(renderer, group_index, group)
                    && adaptive_groups.insert((renderer, group_index))
                {
                    // any track's format carries the group-level metadata
                    let representative = group.format(0).cloned().unwrap_or_default();
                    push_adaptive(&mut snapshot, renderer, group_index, &representative);
                }

                for (track_index, format) in group.formats.iter().enumerate() {
                    if !self.is_playable(renderer, group_index, track_index, format) {
                        trace!(
                            renderer = %renderer,
                            group = group_index,
                            track = track_index,
                            "Track filtered out"
                        );
                        continue;
                    }
                    let id = TrackId::track(renderer, group_index, track_index);
                    push_physical(&mut snapshot, id, format);
                }
            }
        }

        debug!(
            generation,
            video = snapshot.video.len(),
            audio = snapshot.audio.len(),
            text = snapshot.text.len(),
            "Tracks snapshot built"
        );

        snapshot
    }

    /// Whether a group gets an adaptive entry
    pub fn is_adaptive(
        &self,
        renderer: RendererKind,
        group_index: usize,
        group: &TrackGroup,
    ) -> bool {
        self.adaptive_enabled
            && renderer != RendererKind::Text
            && self.mapping.adaptive_support(renderer.index(), group_index)
                != AdaptiveSupport::NotSupported
            && group.len() > 1
    }

    fn is_playable(
        &self,
        renderer: RendererKind,
        group_index: usize,
        track_index: usize,
        format: &Format,
    ) -> bool {
        self.mapping
            .track_format_support(renderer.index(), group_index, track_index)
            == FormatSupport::Handled
            && format.has_id()
    }
}

fn push_adaptive(
    snapshot: &mut TracksSnapshot,
    renderer: RendererKind,
    group_index: usize,
    representative: &Format,
) {
    let id = TrackId::adaptive(renderer, group_index);
    match renderer {
        RendererKind::Video => snapshot.video.push(VideoTrackInfo {
            id,
            bitrate: 0,
            width: 0,
            height: 0,
            is_adaptive: true,
        }),
        RendererKind::Audio => snapshot.audio.push(AudioTrackInfo {
            id,
            language: representative.language.clone(),
            bitrate: 0,
            is_adaptive: true,
        }),
        RendererKind::Text => {}
    }
}

fn push_physical(snapshot: &mut TracksSnapshot, id: TrackId, format: &Format) {
    match id.renderer {
        RendererKind::Video => snapshot.video.push(VideoTrackInfo {
            id,
            bitrate: format.bitrate,
            width: format.width,
            height: format.height,
            is_adaptive: false,
        }),
        RendererKind::Audio => snapshot.audio.push(AudioTrackInfo {
            id,
            language: format.language.clone(),
            bitrate: format.bitrate,
            is_adaptive: false,
        }),
        RendererKind::Text => snapshot.text.push(TextTrackInfo {
            id,
            language: format.language.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RendererTracks;

    fn video_group(count: usize) -> TrackGroup {
        TrackGroup::new(
            (0..count)
                .map(|i| Format::video(format!("v{}", i), 500_000 * (i as u64 + 1), 640, 360))
                .collect(),
        )
    }

    #[test]
    fn test_empty_mapping() {
        let mapping = MappedTrackInfo::default();
        let snapshot = SnapshotBuilder::new(&mapping, true).build(1);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.generation, 1);
    }

    #[test]
    fn test_adaptive_entry_first_in_group() {
        let mapping = MappedTrackInfo::new(vec![RendererTracks::default()
            .with_handled_group(video_group(2), AdaptiveSupport::Seamless)
            .with_handled_group(video_group(3), AdaptiveSupport::NotSeamless)]);

        let snapshot = SnapshotBuilder::new(&mapping, true).build(1);
        let ids: Vec<String> = snapshot.video.iter().map(|t| t.unique_id()).collect();
        assert_eq!(
            ids,
            vec![
                "Video:0,0,adaptive",
                "Video:0,0,0",
                "Video:0,0,1",
                "Video:0,1,adaptive",
                "Video:0,1,0",
                "Video:0,1,1",
                "Video:0,1,2",
            ]
        );
    }

    #[test]
    fn test_adaptive_disabled_without_factory() {
        let mapping = MappedTrackInfo::new(vec![RendererTracks::default()
            .with_handled_group(video_group(2), AdaptiveSupport::Seamless)]);
        let snapshot = SnapshotBuilder::new(&mapping, false).build(1);
        assert!(snapshot.adaptive_track_ids().is_empty());
        assert_eq!(snapshot.video.len(), 2);
    }

    #[test]
    fn test_adaptive_requires_capability() {
        let mapping = MappedTrackInfo::new(vec![RendererTracks::default()
            .with_handled_group(video_group(2), AdaptiveSupport::NotSupported)]);
        let snapshot = SnapshotBuilder::new(&mapping, true).build(1);
        assert!(snapshot.adaptive_track_ids().is_empty());
    }

    #[test]
    fn test_single_track_group_not_adaptive() {
        let mapping = MappedTrackInfo::new(vec![RendererTracks::default()
            .with_handled_group(video_group(1), AdaptiveSupport::Seamless)]);
        let snapshot = SnapshotBuilder::new(&mapping, true).build(1);
        assert_eq!(snapshot.video.len(), 1);
        assert!(!snapshot.video[0].is_adaptive);
    }

    #[test]
    fn test_adaptive_audio_takes_group_language() {
        let group = TrackGroup::new(vec![
            Format::audio("a1", 64_000, "es"),
            Format::audio("a2", 128_000, "es"),
        ]);
        let mapping = MappedTrackInfo::new(vec![
            RendererTracks::default(),
            RendererTracks::default().with_handled_group(group, AdaptiveSupport::Seamless),
        ]);
        let snapshot = SnapshotBuilder::new(&mapping, true).build(1);
        assert_eq!(snapshot.audio.len(), 3);
        assert!(snapshot.audio[0].is_adaptive);
        assert_eq!(snapshot.audio[0].bitrate, 0);
        assert_eq!(snapshot.audio[0].language.as_deref(), Some("es"));
        assert_eq!(snapshot.audio[2].bitrate, 128_000);
    }

    #[test]
    fn test_text_never_adaptive() {
        let group = TrackGroup::new(vec![Format::text("t1", "en"), Format::text("t2", "de")]);
        let mapping = MappedTrackInfo::new(vec![
            RendererTracks::default(),
            RendererTracks::default(),
            RendererTracks::default().with_handled_group(group, AdaptiveSupport::Seamless),
        ]);
        let snapshot = SnapshotBuilder::new(&mapping, true).build(1);
        assert_eq!(snapshot.text.len(), 2);
        assert!(snapshot.adaptive_track_ids().is_empty());
    }

    #[test]
    fn test_missing_id_filtered() {
        let group = TrackGroup::new(vec![
            Format {
                id: None,
                bitrate: 1,
                ..Default::default()
            },
            Format {
                id: Some(String::new()),
                bitrate: 2,
                ..Default::default()
            },
            Format::video("v", 3, 10, 10),
        ]);
        let mapping = MappedTrackInfo::new(vec![
            RendererTracks::default().with_handled_group(group, AdaptiveSupport::NotSupported)
        ]);
        let snapshot = SnapshotBuilder::new(&mapping, true).build(1);
        assert_eq!(snapshot.video.len(), 1);
        assert_eq!(snapshot.video[0].unique_id(), "Video:0,0,2");
    }
}
