//! Track identifiers
//!
//! A [`TrackId`] addresses one entry of a [`TracksSnapshot`](crate::TracksSnapshot):
//! a renderer, a group inside that renderer and either a physical track or the
//! group's adaptive pseudo-track. Applications only ever see the string form:
//!
//! ```text
//! Video:0,1,3          renderer 0, group 1, track 3
//! Audio:1,0,adaptive   renderer 1, group 0, adaptive selection
//! ```
//!
//! The label before `:` is informational; decoding trusts the numeric
//! renderer index.

use crate::error::{Error, Result};
use crate::types::RendererKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Literal used in place of a track index for adaptive entries
pub const ADAPTIVE_TOKEN: &str = "adaptive";

/// Third component of a track id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackIndex {
    /// Physical track inside the group
    Track(usize),
    /// Adaptive selection across the group's tracks
    Adaptive,
}

impl TrackIndex {
    pub fn is_adaptive(self) -> bool {
        matches!(self, TrackIndex::Adaptive)
    }

    /// Physical index, `None` for adaptive
    pub fn physical(self) -> Option<usize> {
        match self {
            TrackIndex::Track(index) => Some(index),
            TrackIndex::Adaptive => None,
        }
    }
}

impl fmt::Display for TrackIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackIndex::Track(index) => write!(f, "{}", index),
            TrackIndex::Adaptive => f.write_str(ADAPTIVE_TOKEN),
        }
    }
}

/// Stable handle of a selectable track within one snapshot generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackId {
    pub renderer: RendererKind,
    pub group_index: usize,
    pub track_index: TrackIndex,
}

impl TrackId {
    pub fn new(renderer: RendererKind, group_index: usize, track_index: TrackIndex) -> Self {
        Self {
            renderer,
            group_index,
            track_index,
        }
    }

    /// Id of a physical track
    pub fn track(renderer: RendererKind, group_index: usize, track_index: usize) -> Self {
        Self::new(renderer, group_index, TrackIndex::Track(track_index))
    }

    /// Id of a group's adaptive entry
    pub fn adaptive(renderer: RendererKind, group_index: usize) -> Self {
        Self::new(renderer, group_index, TrackIndex::Adaptive)
    }

    pub fn is_adaptive(&self) -> bool {
        self.track_index.is_adaptive()
    }

    /// Decode a unique id string
    pub fn parse(unique_id: &str) -> Result<Self> {
        unique_id.parse()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{},{}",
            self.renderer.label(),
            self.renderer.index(),
            self.group_index,
            self.track_index
        )
    }
}

impl FromStr for TrackId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (_label, payload) = s
            .split_once(':')
            .ok_or_else(|| Error::malformed(s, "missing renderer prefix"))?;

        let fields: Vec<&str> = payload.split(',').collect();
        let [renderer, group, track] = fields.as_slice() else {
            return Err(Error::malformed(
                s,
                format!("expected 3 fields, found {}", fields.len()),
            ));
        };

        let renderer_index = parse_index(s, "renderer index", renderer)?;
        let renderer = RendererKind::from_index(renderer_index).ok_or_else(|| {
            Error::malformed(s, format!("unknown renderer index {}", renderer_index))
        })?;
        let group_index = parse_index(s, "group index", group)?;
        let track_index = if *track == ADAPTIVE_TOKEN {
            TrackIndex::Adaptive
        } else {
            TrackIndex::Track(parse_index(s, "track index", track)?)
        };

        Ok(TrackId::new(renderer, group_index, track_index))
    }
}

impl TryFrom<String> for TrackId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TrackId> for String {
    fn from(id: TrackId) -> Self {
        id.to_string()
    }
}

/// Digits only, so every accepted id re-encodes to the same string
fn parse_index(id: &str, what: &str, field: &str) -> Result<usize> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed(id, format!("invalid {} '{}'", what, field)));
    }
    field
        .parse()
        .map_err(|_| Error::malformed(id, format!("{} '{}' out of range", what, field)))
}
