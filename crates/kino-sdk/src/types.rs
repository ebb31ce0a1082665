//! Core types for Kino SDK

use crate::tracks::TrackId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Renderer slots exposed by the playback engine
///
/// The discriminant is the renderer index used in the engine's mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    Video = 0,
    Audio = 1,
    Text = 2,
}

impl RendererKind {
    /// All renderers in scan order
    pub const ALL: [RendererKind; 3] = [
        RendererKind::Video,
        RendererKind::Audio,
        RendererKind::Text,
    ];

    /// Renderer index in the engine mapping
    pub fn index(self) -> usize {
        self as usize
    }

    /// Renderer for an engine renderer index
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(RendererKind::Video),
            1 => Some(RendererKind::Audio),
            2 => Some(RendererKind::Text),
            _ => None,
        }
    }

    /// Label used as the unique id prefix
    pub fn label(self) -> &'static str {
        match self {
            RendererKind::Video => "Video",
            RendererKind::Audio => "Audio",
            RendererKind::Text => "Text",
        }
    }
}

impl std::fmt::Display for RendererKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Video track as exposed to the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTrackInfo {
    /// Track handle, serialized as the unique id string
    #[serde(rename = "unique_id")]
    pub id: TrackId,
    /// Bitrate in bps (0 for adaptive entries)
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
    /// Auto quality entry spanning the whole group
    pub is_adaptive: bool,
}

impl VideoTrackInfo {
    /// Unique id string of this track
    pub fn unique_id(&self) -> String {
        self.id.to_string()
    }

    pub fn track_id(&self) -> TrackId {
        self.id
    }
}

/// Audio track as exposed to the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrackInfo {
    #[serde(rename = "unique_id")]
    pub id: TrackId,
    /// Language code reported by the engine (if any)
    pub language: Option<String>,
    /// Bitrate in bps (0 for adaptive entries)
    pub bitrate: u64,
    pub is_adaptive: bool,
}

impl AudioTrackInfo {
    /// Unique id string of this track
    pub fn unique_id(&self) -> String {
        self.id.to_string()
    }

    pub fn track_id(&self) -> TrackId {
        self.id
    }
}

/// Text track as exposed to the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTrackInfo {
    #[serde(rename = "unique_id")]
    pub id: TrackId,
    pub language: Option<String>,
}

impl TextTrackInfo {
    /// Unique id string of this track
    pub fn unique_id(&self) -> String {
        self.id.to_string()
    }

    pub fn track_id(&self) -> TrackId {
        self.id
    }
}

/// All selectable tracks of the loaded media
///
/// Rebuilt from scratch every time the engine reports new tracks. Ids
/// issued by one generation must not be used against a later one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracksSnapshot {
    /// Prepare cycle that produced this snapshot
    pub generation: u64,
    pub video: Vec<VideoTrackInfo>,
    pub audio: Vec<AudioTrackInfo>,
    pub text: Vec<TextTrackInfo>,
}

impl TracksSnapshot {
    /// Create an empty snapshot for a generation
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }

    /// Total number of entries across all renderers
    pub fn len(&self) -> usize {
        self.video.len() + self.audio.len() + self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Track ids of one renderer in insertion order, with their adaptive flag
    pub fn entries(&self, renderer: RendererKind) -> Vec<(TrackId, bool)> {
        match renderer {
            RendererKind::Video => self.video.iter().map(|t| (t.id, t.is_adaptive)).collect(),
            RendererKind::Audio => self.audio.iter().map(|t| (t.id, t.is_adaptive)).collect(),
            RendererKind::Text => self.text.iter().map(|t| (t.id, false)).collect(),
        }
    }

    /// Every track id in the snapshot, video first
    pub fn track_ids(&self) -> Vec<TrackId> {
        RendererKind::ALL
            .iter()
            .flat_map(|&renderer| self.entries(renderer))
            .map(|(id, _)| id)
            .collect()
    }

    /// Check whether the snapshot published this id
    pub fn contains(&self, id: &TrackId) -> bool {
        self.entries(id.renderer).iter().any(|(entry, _)| entry == id)
    }

    /// Adaptive entries only
    pub fn adaptive_track_ids(&self) -> Vec<TrackId> {
        RendererKind::ALL
            .iter()
            .flat_map(|&renderer| self.entries(renderer))
            .filter(|(_, adaptive)| *adaptive)
            .map(|(id, _)| id)
            .collect()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.video.clear();
        self.audio.clear();
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracks::TrackIndex;

    #[test]
    fn test_renderer_index_roundtrip() {
        for renderer in RendererKind::ALL {
            assert_eq!(RendererKind::from_index(renderer.index()), Some(renderer));
        }
        assert_eq!(RendererKind::from_index(3), None);
    }

    #[test]
    fn test_snapshot_entries() {
        let mut snapshot = TracksSnapshot::new(1);
        snapshot.video.push(VideoTrackInfo {
            id: TrackId::adaptive(RendererKind::Video, 0),
            bitrate: 0,
            width: 0,
            height: 0,
            is_adaptive: true,
        });
        snapshot.text.push(TextTrackInfo {
            id: TrackId::track(RendererKind::Text, 0, 0),
            language: Some("en".into()),
        });

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.adaptive_track_ids().len(), 1);
        assert!(snapshot.contains(&TrackId::track(RendererKind::Text, 0, 0)));
        assert!(!snapshot.contains(&TrackId::track(RendererKind::Text, 0, 1)));
        assert_eq!(snapshot.entries(RendererKind::Video)[0].0.track_index, TrackIndex::Adaptive);

        snapshot.clear();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_track_info_serializes_unique_id() {
        let info = AudioTrackInfo {
            id: TrackId::track(RendererKind::Audio, 1, 2),
            language: Some("fr".into()),
            bitrate: 128_000,
            is_adaptive: false,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["unique_id"], "Audio:1,1,2");
    }
}
