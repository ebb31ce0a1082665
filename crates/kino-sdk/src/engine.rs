//! Playback engine interfaces
//!
//! The SDK never decodes or fetches media itself. It reads the engine's
//! renderer → group → track mapping and pushes selection overrides back.
//!
//! ```text
//! MappedTrackInfo
//! ├── renderer 0 (video) ── TrackGroupArray ── TrackGroup ── Format, Format, ...
//! ├── renderer 1 (audio) ── TrackGroupArray ── ...
//! └── renderer 2 (text)  ── TrackGroupArray ── ...
//! ```
//!
//! [`DefaultTrackSelector`] is an in-memory [`TrackSelector`] used by the CLI
//! and by tests; real players implement the trait over their engine.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Media format of a single track as reported by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    /// Format identifier; tracks without one are not exposed
    pub id: Option<String>,
    /// Bitrate in bps (0 when unknown)
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
    /// Language code (for audio/text tracks)
    pub language: Option<String>,
}

impl Format {
    /// Video format
    pub fn video(id: impl Into<String>, bitrate: u64, width: u32, height: u32) -> Self {
        Self {
            id: Some(id.into()),
            bitrate,
            width,
            height,
            language: None,
        }
    }

    /// Audio format
    pub fn audio(id: impl Into<String>, bitrate: u64, language: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            bitrate,
            language: Some(language.into()),
            ..Default::default()
        }
    }

    /// Text format
    pub fn text(id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            language: Some(language.into()),
            ..Default::default()
        }
    }

    /// Check for a non-empty identifier
    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// How well a renderer can play a single track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatSupport {
    /// Fully handled by the renderer
    Handled,
    /// Handled, but with capabilities beyond what the device declares
    ExceedsCapabilities,
    /// Known MIME type, unsupported subtype
    UnsupportedSubtype,
    /// DRM scheme not supported
    UnsupportedDrm,
    #[default]
    UnsupportedType,
}

/// How well a renderer can switch between the tracks of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptiveSupport {
    /// Seamless switching
    Seamless,
    /// Switching possible with a visible or audible glitch
    NotSeamless,
    #[default]
    NotSupported,
}

/// One group of interchangeable tracks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackGroup {
    pub formats: Vec<Format>,
}

impl TrackGroup {
    pub fn new(formats: Vec<Format>) -> Self {
        Self { formats }
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    pub fn format(&self, track_index: usize) -> Option<&Format> {
        self.formats.get(track_index)
    }
}

/// Track groups of one renderer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackGroupArray {
    pub groups: Vec<TrackGroup>,
}

impl TrackGroupArray {
    pub fn new(groups: Vec<TrackGroup>) -> Self {
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, group_index: usize) -> Option<&TrackGroup> {
        self.groups.get(group_index)
    }
}

/// Capabilities and track groups of one renderer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererTracks {
    pub track_groups: TrackGroupArray,
    /// Per group, per track
    pub format_support: Vec<Vec<FormatSupport>>,
    /// Per group
    pub adaptive_support: Vec<AdaptiveSupport>,
}

impl RendererTracks {
    /// Add a group with per-track support levels
    pub fn with_group(
        mut self,
        group: TrackGroup,
        support: Vec<FormatSupport>,
        adaptive: AdaptiveSupport,
    ) -> Self {
        self.track_groups.groups.push(group);
        self.format_support.push(support);
        self.adaptive_support.push(adaptive);
        self
    }

    /// Add a group where every track is fully handled
    pub fn with_handled_group(self, group: TrackGroup, adaptive: AdaptiveSupport) -> Self {
        let support = vec![FormatSupport::Handled; group.len()];
        self.with_group(group, support, adaptive)
    }
}

/// The engine's renderer → group → track mapping for the loaded media
///
/// Lookups outside the mapping answer the "unsupported" levels instead of
/// panicking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedTrackInfo {
    pub renderers: Vec<RendererTracks>,
}

static EMPTY_GROUPS: TrackGroupArray = TrackGroupArray { groups: Vec::new() };

impl MappedTrackInfo {
    pub fn new(renderers: Vec<RendererTracks>) -> Self {
        Self { renderers }
    }

    /// Number of renderers in the mapping
    pub fn renderer_count(&self) -> usize {
        self.renderers.len()
    }

    /// Track groups of a renderer (empty if the renderer is absent)
    pub fn track_groups(&self, renderer_index: usize) -> &TrackGroupArray {
        self.renderers
            .get(renderer_index)
            .map(|r| &r.track_groups)
            .unwrap_or(&EMPTY_GROUPS)
    }

    /// Support level of a single track
    pub fn track_format_support(
        &self,
        renderer_index: usize,
        group_index: usize,
        track_index: usize,
    ) -> FormatSupport {
        self.renderers
            .get(renderer_index)
            .and_then(|r| r.format_support.get(group_index))
            .and_then(|g| g.get(track_index))
            .copied()
            .unwrap_or_default()
    }

    /// Adaptive capability of a group
    pub fn adaptive_support(&self, renderer_index: usize, group_index: usize) -> AdaptiveSupport {
        self.renderers
            .get(renderer_index)
            .and_then(|r| r.adaptive_support.get(group_index))
            .copied()
            .unwrap_or_default()
    }
}

/// Track selection strategy handed to the engine with an override
pub trait TrackSelectionFactory: fmt::Debug + Send + Sync {
    /// Strategy name, for logs and analytics
    fn name(&self) -> &'static str;

    /// True if the strategy switches between tracks on its own
    fn is_adaptive(&self) -> bool;
}

/// Always plays the first track of the override
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTrackSelectionFactory;

impl TrackSelectionFactory for FixedTrackSelectionFactory {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn is_adaptive(&self) -> bool {
        false
    }
}

/// Lets the engine switch between the override's tracks by bandwidth
///
/// The parameters are passed through to the engine untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveTrackSelectionFactory {
    /// Fraction of the estimated bandwidth the selection may use
    pub bandwidth_fraction: f32,
    /// Buffered media required before switching up (ms)
    pub min_duration_for_quality_increase_ms: u64,
    /// Buffered media below which switching down is allowed (ms)
    pub max_duration_for_quality_decrease_ms: u64,
    /// Buffered media kept after switching up (ms)
    pub min_duration_to_retain_after_discard_ms: u64,
}

impl Default for AdaptiveTrackSelectionFactory {
    fn default() -> Self {
        Self {
            bandwidth_fraction: 0.7,
            min_duration_for_quality_increase_ms: 10_000,
            max_duration_for_quality_decrease_ms: 25_000,
            min_duration_to_retain_after_discard_ms: 25_000,
        }
    }
}

impl TrackSelectionFactory for AdaptiveTrackSelectionFactory {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn is_adaptive(&self) -> bool {
        true
    }
}

/// Forces the selection of a renderer to tracks of one group
#[derive(Debug, Clone)]
pub struct SelectionOverride {
    pub factory: Arc<dyn TrackSelectionFactory>,
    pub group_index: usize,
    pub tracks: Vec<usize>,
}

impl SelectionOverride {
    pub fn new(
        factory: Arc<dyn TrackSelectionFactory>,
        group_index: usize,
        tracks: Vec<usize>,
    ) -> Self {
        Self {
            factory,
            group_index,
            tracks,
        }
    }

    /// Override selecting a single track with the fixed strategy
    pub fn fixed(group_index: usize, track_index: usize) -> Self {
        Self::new(Arc::new(FixedTrackSelectionFactory), group_index, vec![track_index])
    }

    pub fn is_adaptive(&self) -> bool {
        self.factory.is_adaptive()
    }

    pub fn contains(&self, track_index: usize) -> bool {
        self.tracks.contains(&track_index)
    }
}

impl PartialEq for SelectionOverride {
    fn eq(&self, other: &Self) -> bool {
        self.group_index == other.group_index
            && self.tracks == other.tracks
            && self.factory.name() == other.factory.name()
    }
}

impl fmt::Display for SelectionOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} group={} tracks={:?}",
            self.factory.name(),
            self.group_index,
            self.tracks
        )
    }
}

/// The engine side of track selection
///
/// Implementations are expected to be driven from the player's control
/// thread; the SDK never calls them concurrently for the same player.
pub trait TrackSelector: Send + Sync {
    /// Mapping of the currently loaded media, if tracks are known
    ///
    /// Must hand out the same `Arc` until the mapping changes; a new `Arc`
    /// marks every previously issued track id as stale.
    fn current_mapping(&self) -> Option<Arc<MappedTrackInfo>>;

    fn renderer_disabled(&self, renderer_index: usize) -> bool;

    fn set_renderer_disabled(&self, renderer_index: usize, disabled: bool);

    /// Replace the selection of a renderer
    fn set_selection_override(
        &self,
        renderer_index: usize,
        groups: &TrackGroupArray,
        selection: SelectionOverride,
    );

    /// Drop every override of a renderer
    fn clear_selection_overrides(&self, renderer_index: usize);
}

#[derive(Debug, Default)]
struct SelectorState {
    mapping: Option<Arc<MappedTrackInfo>>,
    disabled: HashMap<usize, bool>,
    overrides: HashMap<usize, SelectionOverride>,
}

/// In-memory track selector
#[derive(Debug, Default)]
pub struct DefaultTrackSelector {
    state: RwLock<SelectorState>,
}

impl DefaultTrackSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector with media already mapped
    pub fn with_mapping(mapping: MappedTrackInfo) -> Self {
        let selector = Self::new();
        selector.set_mapping(mapping);
        selector
    }

    /// Install the mapping of newly loaded media
    ///
    /// Overrides of the previous media no longer apply and are dropped.
    pub fn set_mapping(&self, mapping: MappedTrackInfo) {
        let mut state = self.state.write();
        state.mapping = Some(Arc::new(mapping));
        state.overrides.clear();
    }

    /// Override currently set for a renderer
    pub fn selection_override(&self, renderer_index: usize) -> Option<SelectionOverride> {
        self.state.read().overrides.get(&renderer_index).cloned()
    }
}

impl TrackSelector for DefaultTrackSelector {
    fn current_mapping(&self) -> Option<Arc<MappedTrackInfo>> {
        self.state.read().mapping.clone()
    }

    fn renderer_disabled(&self, renderer_index: usize) -> bool {
        self.state
            .read()
            .disabled
            .get(&renderer_index)
            .copied()
            .unwrap_or(false)
    }

    fn set_renderer_disabled(&self, renderer_index: usize, disabled: bool) {
        self.state.write().disabled.insert(renderer_index, disabled);
    }

    fn set_selection_override(
        &self,
        renderer_index: usize,
        _groups: &TrackGroupArray,
        selection: SelectionOverride,
    ) {
        debug!(renderer = renderer_index, selection = %selection, "Selection override set");
        self.state.write().overrides.insert(renderer_index, selection);
    }

    fn clear_selection_overrides(&self, renderer_index: usize) {
        debug!(renderer = renderer_index, "Selection overrides cleared");
        self.state.write().overrides.remove(&renderer_index);
    }
}
