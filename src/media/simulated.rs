//! Deterministic in-process media engine
//!
//! [`SimulatedMedia`] implements [`MediaElement`] without decoding anything.
//! Its paired [`SimulatedHandle`] plays the role of the engine's internals:
//! the host decides when metadata arrives, how far the clock advances and
//! when a load fails. Every request made through the adapter is recorded so
//! tests can assert on what the controller asked for.

use crate::media::{EventSink, EventStream, MediaElement, MediaEvent};
use crate::utils::error::{LecturePlayerError, Result};
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

/// A request received by the simulated engine
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
    SetMuted(bool),
    SetRate(f64),
    RequestFullscreen,
    ExitFullscreen,
    Release,
}

#[derive(Debug)]
struct EngineState {
    source: Option<String>,
    sink: Option<EventSink>,
    position: f64,
    duration: Option<f64>,
    playing: bool,
    volume: f64,
    muted: bool,
    rate: f64,
    fullscreen: bool,
    calls: Vec<AdapterCall>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            source: None,
            sink: None,
            position: 0.0,
            duration: None,
            playing: false,
            volume: 1.0,
            muted: false,
            rate: 1.0,
            fullscreen: false,
            calls: Vec::new(),
        }
    }
}

impl EngineState {
    fn emit(&self, event: MediaEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(event);
        }
    }
}

/// Simulated media element
#[derive(Debug)]
pub struct SimulatedMedia {
    engine: Arc<Mutex<EngineState>>,
}

/// Host-side control over a [`SimulatedMedia`]
#[derive(Debug, Clone)]
pub struct SimulatedHandle {
    engine: Arc<Mutex<EngineState>>,
}

impl SimulatedMedia {
    /// Create an engine and the handle that drives it
    pub fn new() -> (SimulatedMedia, SimulatedHandle) {
        let engine = Arc::new(Mutex::new(EngineState::default()));
        (
            SimulatedMedia {
                engine: Arc::clone(&engine),
            },
            SimulatedHandle { engine },
        )
    }
}

impl MediaElement for SimulatedMedia {
    fn load(&mut self, source: &str) -> Result<EventStream> {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::Load(source.to_string()));

        let (sink, stream) = EventStream::channel();
        engine.sink = Some(sink);
        engine.source = Some(source.to_string());
        engine.position = 0.0;
        engine.duration = None;
        engine.playing = false;
        engine.emit(MediaEvent::LoadStart);

        debug!("Simulated engine bound to {}", source);
        Ok(stream)
    }

    fn play(&mut self) -> Result<()> {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::Play);

        if engine.source.is_none() {
            return Err(LecturePlayerError::Media("No source bound".to_string()));
        }
        if !engine.playing {
            engine.playing = true;
            engine.emit(MediaEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::Pause);

        if engine.playing {
            engine.playing = false;
            engine.emit(MediaEvent::Pause);
        }
        Ok(())
    }

    fn seek(&mut self, time: f64) {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::Seek(time));
        engine.position = time;
        engine.emit(MediaEvent::TimeUpdate(time));
    }

    fn set_volume(&mut self, volume: f64) {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::SetVolume(volume));
        engine.volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::SetMuted(muted));
        engine.muted = muted;
    }

    fn set_rate(&mut self, rate: f64) {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::SetRate(rate));
        engine.rate = rate;
    }

    fn request_fullscreen(&mut self) -> Result<()> {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::RequestFullscreen);
        engine.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::ExitFullscreen);
        engine.fullscreen = false;
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.engine.lock().fullscreen
    }

    fn release(&mut self) {
        let mut engine = self.engine.lock();
        engine.calls.push(AdapterCall::Release);
        engine.sink = None;
        engine.source = None;
        engine.position = 0.0;
        engine.duration = None;
        engine.playing = false;
    }
}

impl SimulatedHandle {
    /// Metadata arrived: report the duration and that playback can start
    pub fn ready(&self, duration: f64) {
        let mut engine = self.engine.lock();
        engine.duration = Some(duration);
        engine.emit(MediaEvent::DurationChange(duration));
        engine.emit(MediaEvent::CanPlay);
    }

    /// Advance the engine clock by `elapsed` seconds of wall time
    ///
    /// Emits a time update while playing. Reaching the known duration pauses
    /// the engine and emits `Ended`.
    pub fn tick(&self, elapsed: f64) {
        let mut engine = self.engine.lock();
        if !engine.playing {
            return;
        }

        let mut position = engine.position + elapsed * engine.rate;
        let finished = match engine.duration {
            Some(duration) if duration.is_finite() && position >= duration => {
                position = duration;
                true
            }
            _ => false,
        };

        engine.position = position;
        engine.emit(MediaEvent::TimeUpdate(position));

        if finished {
            engine.playing = false;
            engine.emit(MediaEvent::Pause);
            engine.emit(MediaEvent::Ended);
        }
    }

    /// Fail the current load
    pub fn fail(&self, message: &str) {
        let mut engine = self.engine.lock();
        engine.playing = false;
        engine.emit(MediaEvent::Error(message.to_string()));
    }

    /// Deliver an arbitrary event on the current stream
    pub fn emit(&self, event: MediaEvent) {
        self.engine.lock().emit(event);
    }

    /// Every request received so far
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.engine.lock().calls.clone()
    }

    /// Forget recorded requests
    pub fn clear_calls(&self) {
        self.engine.lock().calls.clear();
    }

    pub fn source(&self) -> Option<String> {
        self.engine.lock().source.clone()
    }

    pub fn position(&self) -> f64 {
        self.engine.lock().position
    }

    pub fn volume(&self) -> f64 {
        self.engine.lock().volume
    }

    pub fn is_muted(&self) -> bool {
        self.engine.lock().muted
    }

    pub fn rate(&self) -> f64 {
        self.engine.lock().rate
    }

    pub fn is_playing(&self) -> bool {
        self.engine.lock().playing
    }

    /// Whether a source is bound and events can still be delivered
    pub fn is_bound(&self) -> bool {
        self.engine.lock().sink.is_some()
    }
}
