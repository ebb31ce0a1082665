//! Ad break bookkeeping
//!
//! Cue points are ad break positions in milliseconds as reported by the ad
//! plugin: `0` is a pre-roll, positive values are mid-rolls and a negative
//! value marks a post-roll.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ad break positions of the loaded media
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCuePoints {
    /// Cue points in milliseconds, in the order the ad server sent them
    pub cue_points: Vec<i64>,
    /// Plugin that reported the cue points
    #[serde(default)]
    pub ad_plugin_name: String,
}

impl AdCuePoints {
    pub fn new(cue_points: Vec<i64>) -> Self {
        Self {
            cue_points,
            ad_plugin_name: String::new(),
        }
    }

    pub fn with_plugin_name(mut self, name: impl Into<String>) -> Self {
        self.ad_plugin_name = name.into();
        self
    }

    pub fn has_pre_roll(&self) -> bool {
        self.cue_points.first() == Some(&0)
    }

    pub fn has_mid_roll(&self) -> bool {
        self.cue_points.iter().any(|&cue| cue > 0)
    }

    pub fn has_post_roll(&self) -> bool {
        self.cue_points.last().is_some_and(|&cue| cue < 0)
    }

    /// Mid-roll positions
    pub fn mid_rolls(&self) -> Vec<Duration> {
        self.cue_points
            .iter()
            .filter(|&&cue| cue > 0)
            .map(|&cue| Duration::from_millis(cue as u64))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cue_points.is_empty()
    }
}

/// Controls exposed by an ad plugin while an ad is playing
pub trait AdController: Send + Sync {
    fn skip_ad(&self);

    fn open_learn_more(&self);

    fn open_companion_ad_learn_more(&self);

    fn screen_orientation_changed(&self, is_full_screen: bool);

    fn volume_key_silent(&self, is_mute: bool);

    /// Position inside the current ad
    fn ad_current_position(&self) -> Duration;

    fn ad_duration(&self) -> Duration;

    /// Time left in the current ad
    fn ad_remaining(&self) -> Duration {
        self.ad_duration().saturating_sub(self.ad_current_position())
    }
}
