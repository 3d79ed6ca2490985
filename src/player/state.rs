//! Playback state store
//!
//! [`PlaybackStore`] folds media events and control changes into a
//! [`PlaybackState`]. It has no side effects of its own; events that the
//! controller must react to are reported back as [`StoreSignal`]s.

use crate::media::MediaEvent;
use crate::player::{PlaybackState, VideoQuality};
use log::debug;

/// Follow-up work an event asks of the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreSignal {
    /// Position changed and should be reported to the owner
    TimeUpdated(f64),

    /// Playback reached the end of the media
    Ended,
}

/// Owner of the live [`PlaybackState`]
#[derive(Debug, Clone, Default)]
pub struct PlaybackStore {
    state: PlaybackState,
}

impl PlaybackStore {
    /// Create a store with a restored or default volume
    pub fn new(volume: f64) -> Self {
        let volume = volume.clamp(0.0, 1.0);
        Self {
            state: PlaybackState {
                volume,
                is_muted: volume == 0.0,
                ..PlaybackState::default()
            },
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Apply an engine event
    pub fn apply(&mut self, event: &MediaEvent) -> Option<StoreSignal> {
        match event {
            MediaEvent::TimeUpdate(time) => {
                if !time.is_finite() {
                    return None;
                }
                let time = self.clamp_time(*time);
                self.state.current_time = time;
                Some(StoreSignal::TimeUpdated(time))
            }
            MediaEvent::DurationChange(duration) => {
                if duration.is_finite() && *duration >= 0.0 {
                    self.state.duration = *duration;
                    if self.state.current_time > self.state.duration {
                        self.state.current_time = self.state.duration;
                    }
                } else {
                    debug!("Ignoring unusable duration {}", duration);
                }
                None
            }
            MediaEvent::Play => {
                self.state.is_playing = true;
                None
            }
            MediaEvent::Pause => {
                self.state.is_playing = false;
                None
            }
            MediaEvent::LoadStart => {
                self.state.is_loading = true;
                self.state.error = None;
                None
            }
            MediaEvent::CanPlay => {
                self.state.is_loading = false;
                None
            }
            MediaEvent::Ended => {
                self.state.is_playing = false;
                Some(StoreSignal::Ended)
            }
            MediaEvent::Error(message) => {
                self.state.error = Some(message.clone());
                self.state.is_loading = false;
                self.state.is_playing = false;
                None
            }
        }
    }

    /// Clamp a position into `[0, duration]`
    ///
    /// The upper bound only applies once the duration is known.
    pub fn clamp_time(&self, time: f64) -> f64 {
        let time = time.max(0.0);
        if self.state.duration > 0.0 {
            time.min(self.state.duration)
        } else {
            time
        }
    }

    /// Record a position chosen by the user
    pub fn set_position(&mut self, time: f64) -> f64 {
        let time = self.clamp_time(time);
        self.state.current_time = time;
        time
    }

    /// Record a volume; zero volume reads as muted
    pub fn set_volume(&mut self, volume: f64) -> f64 {
        let volume = volume.clamp(0.0, 1.0);
        self.state.volume = volume;
        self.state.is_muted = volume == 0.0;
        volume
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.state.is_muted = muted;
    }

    /// Record a playback rate. Rejects non-positive and non-finite rates.
    pub fn set_rate(&mut self, rate: f64) -> bool {
        if rate.is_finite() && rate > 0.0 {
            self.state.playback_rate = rate;
            true
        } else {
            false
        }
    }

    pub fn set_quality(&mut self, quality: VideoQuality) {
        self.state.video_quality = quality;
    }

    /// Flip captions and return the new setting
    pub fn toggle_captions(&mut self) -> bool {
        self.state.captions_enabled = !self.state.captions_enabled;
        self.state.captions_enabled
    }

    /// Forget everything tied to the previous lecture
    ///
    /// Volume, mute, rate, quality and captions are viewer preferences and
    /// survive the switch.
    pub fn reset_for_lecture(&mut self) {
        self.state.current_time = 0.0;
        self.state.duration = 0.0;
        self.state.is_playing = false;
    }
}
