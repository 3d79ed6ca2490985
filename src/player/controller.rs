//! Playback controller
//!
//! [`PlaybackController`] owns one media element for the lifetime of a
//! mounted player. It executes [`Command`]s against the element, folds the
//! element's events into the [`PlaybackStore`], remembers the chosen volume
//! and arms the auto-advance timer when a lecture ends.
//!
//! Commands never fail from the caller's point of view: engine and storage
//! errors are logged, and commands issued after teardown do nothing.

use crate::course::Lecture;
use crate::media::{EventStream, MediaElement, MediaEvent};
use crate::player::{
    AutoAdvanceTimer, Command, PlaybackState, PlaybackStore, PlayerConfig, SectionHandler, StoreSignal,
    VideoQuality,
};
use crate::storage::{KeyValueStore, VolumePreference};
use log::{debug, info, warn};
use std::sync::Arc;

/// Source bound for `lecture`: its own media, or the placeholder
pub(crate) fn media_source<'a>(lecture: &'a Lecture, config: &'a PlayerConfig) -> &'a str {
    lecture
        .video_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .unwrap_or(&config.placeholder_source)
}

/// Controller for a single mounted player
pub struct PlaybackController {
    media: Option<Box<dyn MediaElement>>,
    events: Option<EventStream>,
    store: PlaybackStore,
    timer: AutoAdvanceTimer,
    volume_pref: VolumePreference,
    handler: Arc<dyn SectionHandler>,
    config: PlayerConfig,
    lecture_id: Option<u64>,
}

impl PlaybackController {
    /// Take ownership of `media` and restore the remembered volume
    ///
    /// The restored volume is applied before the controller is returned, so
    /// the first rendered controls already show it.
    pub fn new(
        mut media: Box<dyn MediaElement>,
        storage: Arc<dyn KeyValueStore>,
        handler: Arc<dyn SectionHandler>,
        config: PlayerConfig,
    ) -> Self {
        let volume_pref = VolumePreference::new(storage, config.volume_storage_key.clone());
        let volume = match volume_pref.load() {
            Some(volume) => {
                info!("Restored volume {:.2}", volume);
                volume
            }
            None => config.default_volume,
        };

        let store = PlaybackStore::new(volume);
        media.set_volume(store.state().volume);
        media.set_muted(store.state().is_muted);

        Self {
            media: Some(media),
            events: None,
            store,
            timer: AutoAdvanceTimer::new(config.auto_advance_delay()),
            volume_pref,
            handler,
            config,
            lecture_id: None,
        }
    }

    /// Current playback state
    pub fn state(&self) -> &PlaybackState {
        self.store.state()
    }

    /// Identifier of the bound lecture
    pub fn lecture_id(&self) -> Option<u64> {
        self.lecture_id
    }

    /// Whether an auto-advance is waiting to fire
    pub fn auto_advance_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Bind `lecture` as the active lecture
    ///
    /// Cancels any pending auto-advance, resets position and playing state,
    /// and loads the lecture's media (or the placeholder source).
    pub fn load_lecture(&mut self, lecture: &Lecture) {
        self.timer.cancel();
        self.store.reset_for_lecture();
        self.lecture_id = Some(lecture.id);

        let Some(media) = self.media.as_mut() else {
            debug!("Ignoring lecture {} after teardown", lecture.id);
            return;
        };

        let source = media_source(lecture, &self.config);
        info!("Loading lecture {} from {}", lecture.id, source);
        match media.load(source) {
            Ok(stream) => self.events = Some(stream),
            Err(e) => {
                warn!("Failed to load lecture {}: {}", lecture.id, e);
                self.events = None;
                self.store.apply(&MediaEvent::Error(e.to_string()));
            }
        }
    }

    /// Release the bound lecture but keep the element for later lectures
    pub fn unload(&mut self) {
        self.timer.cancel();
        self.events = None;
        self.lecture_id = None;
        self.store.reset_for_lecture();

        if let Some(media) = self.media.as_mut() {
            if let Err(e) = media.pause() {
                debug!("Pause during unload failed: {}", e);
            }
            media.seek(0.0);
            media.release();
        }
    }

    /// Stop for good: cancel the timer, stop playback and drop the element
    ///
    /// No event is processed and no command reaches the element afterwards.
    pub fn teardown(&mut self) {
        if self.media.is_none() {
            return;
        }
        self.unload();
        self.media = None;
        info!("Playback controller torn down");
    }

    /// Process every event the element has delivered so far
    ///
    /// Returns the number of events applied.
    pub fn pump_media_events(&mut self) -> usize {
        let pending: Vec<MediaEvent> = match &self.events {
            Some(stream) => stream.drain().collect(),
            None => return 0,
        };

        let count = pending.len();
        for event in pending {
            self.handle_media_event(event);
        }
        count
    }

    /// Apply a single engine event
    pub fn handle_media_event(&mut self, event: MediaEvent) {
        if self.media.is_none() {
            return;
        }

        if let MediaEvent::Error(message) = &event {
            warn!("Media error: {}", message);
        }

        match self.store.apply(&event) {
            Some(StoreSignal::TimeUpdated(time)) => self.handler.on_time_update(time),
            Some(StoreSignal::Ended) => {
                info!("Lecture {:?} finished", self.lecture_id);
                self.handler.on_video_end();
                let handler = Arc::clone(&self.handler);
                self.timer.arm(move || {
                    info!("Auto-advancing to the next lecture");
                    handler.on_next();
                });
            }
            None => {}
        }
    }

    /// Execute a user command
    pub fn execute(&mut self, command: Command) {
        debug!("Command: {:?}", command);
        match command {
            Command::TogglePlay => self.toggle_play(),
            Command::SeekTo(time) => self.seek_to(time),
            Command::SkipForward => self.skip(self.config.skip_step_secs),
            Command::SkipBackward => self.skip(-self.config.skip_step_secs),
            Command::SetVolume(volume) => self.set_volume(volume),
            Command::StepVolume(delta) => self.step_volume(delta),
            Command::ToggleMute => self.toggle_mute(),
            Command::SetRate(rate) => self.set_rate(rate),
            Command::SetQuality(quality) => self.set_quality(quality),
            Command::ToggleCaptions => self.toggle_captions(),
            Command::ToggleFullscreen => self.toggle_fullscreen(),
        }
    }

    /// Request play or pause depending on the observed state
    ///
    /// The state flips only when the element reports the transition.
    pub fn toggle_play(&mut self) {
        let playing = self.store.state().is_playing;
        let Some(media) = self.media.as_mut() else {
            return;
        };

        let result = if playing { media.pause() } else { media.play() };
        if let Err(e) = result {
            warn!("Failed to {}: {}", if playing { "pause" } else { "play" }, e);
        }
    }

    /// Move to an absolute position, clamped to the media
    pub fn seek_to(&mut self, time: f64) {
        if !time.is_finite() {
            debug!("Ignoring seek to {}", time);
            return;
        }
        let Some(media) = self.media.as_mut() else {
            return;
        };

        let time = self.store.clamp_time(time);
        media.seek(time);
        self.store.set_position(time);
    }

    /// Move relative to the current position
    pub fn skip(&mut self, delta: f64) {
        let target = self.store.state().current_time + delta;
        self.seek_to(target);
    }

    /// Set and remember the output volume
    pub fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            debug!("Ignoring volume {}", volume);
            return;
        }
        let Some(media) = self.media.as_mut() else {
            return;
        };

        let volume = volume.clamp(0.0, 1.0);
        media.set_volume(volume);
        media.set_muted(volume == 0.0);
        self.store.set_volume(volume);
        self.volume_pref.save(volume);
        debug!("Volume set to {:.2}", volume);
    }

    /// Nudge the volume, rounding to hundredths
    pub fn step_volume(&mut self, delta: f64) {
        let target = ((self.store.state().volume + delta) * 100.0).round() / 100.0;
        self.set_volume(target.clamp(0.0, 1.0));
    }

    pub fn toggle_mute(&mut self) {
        let Some(media) = self.media.as_mut() else {
            return;
        };

        let muted = !self.store.state().is_muted;
        media.set_muted(muted);
        self.store.set_muted(muted);
        info!("{}", if muted { "Muted" } else { "Unmuted" });
    }

    pub fn set_rate(&mut self, rate: f64) {
        let Some(media) = self.media.as_mut() else {
            return;
        };

        if self.store.set_rate(rate) {
            media.set_rate(rate);
            info!("Playback rate set to {:.2}x", rate);
        } else {
            warn!("Rejected playback rate {}", rate);
        }
    }

    /// Record the requested quality
    ///
    /// Sources are not switched; the selection only drives the controls.
    pub fn set_quality(&mut self, quality: VideoQuality) {
        if self.media.is_none() {
            return;
        }
        self.store.set_quality(quality);
        info!("Quality changed to: {}", quality);
    }

    /// Flip the captions flag. Presentation only.
    pub fn toggle_captions(&mut self) {
        if self.media.is_none() {
            return;
        }
        let enabled = self.store.toggle_captions();
        info!("Captions {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn toggle_fullscreen(&mut self) {
        let Some(media) = self.media.as_mut() else {
            return;
        };

        let result = if media.is_fullscreen() {
            media.exit_fullscreen()
        } else {
            media.request_fullscreen()
        };
        if let Err(e) = result {
            warn!("Fullscreen change failed: {}", e);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("lecture_id", &self.lecture_id)
            .field("state", self.store.state())
            .field("attached", &self.media.is_some())
            .field("timer", &self.timer)
            .finish()
    }
}
