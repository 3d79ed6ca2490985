//! Lecture playback module
//!
//! This module turns media engine events and user commands into observable
//! playback state, schedules auto-advance to the next lecture, and composes
//! everything into a render-ready view of the playback section.

mod controller;
mod section;
mod state;
mod timer;
mod view;

pub use controller::PlaybackController;
pub use section::{PlaybackSection, SectionBuilder};
pub use state::{PlaybackStore, StoreSignal};
pub use timer::AutoAdvanceTimer;
pub use view::{
    AttachmentLink, ControlsView, LectureMetadata, NavigationArrows, Overlay, PlayerView, SectionView,
};

use crate::utils::error::{LecturePlayerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Source bound when a lecture has no media of its own
pub const PLACEHOLDER_SOURCE: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

/// Storage key holding the last chosen volume
pub const VOLUME_STORAGE_KEY: &str = "video-volume";

/// Rendition the viewer asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VideoQuality {
    #[default]
    Auto,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

impl VideoQuality {
    /// Every selectable quality, best first after `Auto`
    pub const ALL: [VideoQuality; 5] = [
        VideoQuality::Auto,
        VideoQuality::P1080,
        VideoQuality::P720,
        VideoQuality::P480,
        VideoQuality::P360,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VideoQuality::Auto => "Auto",
            VideoQuality::P1080 => "1080p",
            VideoQuality::P720 => "720p",
            VideoQuality::P480 => "480p",
            VideoQuality::P360 => "360p",
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VideoQuality {
    type Err = LecturePlayerError;

    fn from_str(s: &str) -> Result<Self> {
        VideoQuality::ALL
            .into_iter()
            .find(|q| q.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| LecturePlayerError::InvalidInput(format!("Unknown video quality '{}'", s)))
    }
}

/// Observable playback state for one mounted player
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Position in seconds
    pub current_time: f64,

    /// Media length in seconds, 0 until metadata loads
    pub duration: f64,

    pub is_playing: bool,
    pub is_loading: bool,
    pub is_muted: bool,

    /// Output volume (0.0 to 1.0)
    pub volume: f64,

    /// Playback speed multiplier
    pub playback_rate: f64,

    pub video_quality: VideoQuality,
    pub captions_enabled: bool,

    /// Last load or decode failure
    pub error: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            is_loading: false,
            is_muted: false,
            volume: 1.0,
            playback_rate: 1.0,
            video_quality: VideoQuality::Auto,
            captions_enabled: false,
            error: None,
        }
    }
}

/// A user-issued playback intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    TogglePlay,
    /// Absolute position in seconds
    SeekTo(f64),
    SkipForward,
    SkipBackward,
    /// Absolute volume
    SetVolume(f64),
    /// Volume change relative to the current level
    StepVolume(f64),
    ToggleMute,
    SetRate(f64),
    SetQuality(VideoQuality),
    ToggleCaptions,
    ToggleFullscreen,
}

/// Player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Seconds moved by a skip forward/backward
    pub skip_step_secs: f64,

    /// Volume change per arrow key press
    pub volume_step: f64,

    /// Grace period between the end of a lecture and auto-advance
    pub auto_advance_delay_ms: u64,

    /// Volume used when nothing is remembered (0.0 to 1.0)
    pub default_volume: f64,

    /// Source bound for lectures without media
    pub placeholder_source: String,

    /// Preference key for the remembered volume
    pub volume_storage_key: String,

    /// Qualities offered in the controls menu
    pub available_qualities: Vec<VideoQuality>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            skip_step_secs: 10.0,
            volume_step: 0.1,
            auto_advance_delay_ms: 2000,
            default_volume: 1.0,
            placeholder_source: PLACEHOLDER_SOURCE.to_string(),
            volume_storage_key: VOLUME_STORAGE_KEY.to_string(),
            available_qualities: VideoQuality::ALL.to_vec(),
        }
    }
}

impl PlayerConfig {
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(LecturePlayerError::Config(
                "Default volume must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(self.skip_step_secs.is_finite() && self.skip_step_secs > 0.0) {
            return Err(LecturePlayerError::Config("Skip step must be positive".to_string()));
        }
        if !(self.volume_step > 0.0 && self.volume_step <= 1.0) {
            return Err(LecturePlayerError::Config(
                "Volume step must be in (0.0, 1.0]".to_string(),
            ));
        }
        if self.placeholder_source.is_empty() {
            return Err(LecturePlayerError::Config("Placeholder source must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Notifications the playback section sends to its owner
///
/// All calls are fire-and-forget. `on_next` may be invoked from the
/// auto-advance task, hence `Send + Sync`.
pub trait SectionHandler: Send + Sync {
    /// Move on to the following lecture
    fn on_next(&self);

    /// Go back to the preceding lecture
    fn on_previous(&self);

    /// The viewer marked the lecture complete
    fn on_mark_complete(&self);

    /// Playback of the current lecture reached its end
    fn on_video_end(&self);

    /// Playback position moved
    fn on_time_update(&self, _time: f64) {}
}
