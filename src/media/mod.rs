//! Media element adapter
//!
//! This module defines the seam between the playback controller and the
//! engine that actually plays media. The controller issues imperative
//! requests through [`MediaElement`] and observes their effect only through
//! the [`EventStream`] returned by [`MediaElement::load`].

mod simulated;

pub use simulated::{AdapterCall, SimulatedHandle, SimulatedMedia};

use crate::utils::error::Result;
use crossbeam_channel::{Receiver, Sender};

/// Event emitted by a media engine
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position moved (seconds)
    TimeUpdate(f64),

    /// Media duration became known or changed (seconds). May be NaN or
    /// infinite while the media is not ready.
    DurationChange(f64),

    /// Engine started playing
    Play,

    /// Engine paused
    Pause,

    /// Engine began fetching a new source
    LoadStart,

    /// Enough data is buffered to start playing
    CanPlay,

    /// Playback reached the end of the media
    Ended,

    /// Engine failed to load or decode
    Error(String),
}

/// Media engine interface
///
/// `play` and `pause` are requests: the engine reports the transition later
/// with [`MediaEvent::Play`] / [`MediaEvent::Pause`]. Position clamping is
/// the caller's job; `seek` sets whatever it is given.
pub trait MediaElement: Send {
    /// Bind a new source and return its event stream
    ///
    /// Resets playback position to zero. The stream returned by the previous
    /// `load` ends.
    fn load(&mut self, source: &str) -> Result<EventStream>;

    /// Request playback
    fn play(&mut self) -> Result<()>;

    /// Request pause
    fn pause(&mut self) -> Result<()>;

    /// Set the playback position in seconds
    fn seek(&mut self, time: f64);

    /// Set output volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f64);

    /// Set the muted flag
    fn set_muted(&mut self, muted: bool);

    /// Set the playback rate multiplier
    fn set_rate(&mut self, rate: f64);

    /// Enter fullscreen presentation
    fn request_fullscreen(&mut self) -> Result<()>;

    /// Leave fullscreen presentation
    fn exit_fullscreen(&mut self) -> Result<()>;

    /// Whether the host currently presents this element fullscreen
    fn is_fullscreen(&self) -> bool;

    /// Stop emitting, release the bound source and reset position to zero
    fn release(&mut self);
}

/// Sending half of a media event stream, held by the engine
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<MediaEvent>,
}

impl EventSink {
    /// Emit an event. Returns false once the stream has been dropped.
    pub fn emit(&self, event: MediaEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Lazy stream of media events for one loaded source
///
/// Iterating blocks for the next event and ends when the engine releases
/// the source or loads another one. Cooperative hosts use
/// [`EventStream::try_next`] or [`EventStream::drain`] instead.
#[derive(Debug)]
pub struct EventStream {
    rx: Receiver<MediaEvent>,
}

impl EventStream {
    /// Create a connected sink/stream pair
    pub fn channel() -> (EventSink, EventStream) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (EventSink { tx }, EventStream { rx })
    }

    /// Take the next already-delivered event without blocking
    pub fn try_next(&self) -> Option<MediaEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every already-delivered event, in delivery order
    pub fn drain(&self) -> impl Iterator<Item = MediaEvent> + '_ {
        self.rx.try_iter()
    }
}

impl Iterator for EventStream {
    type Item = MediaEvent;

    fn next(&mut self) -> Option<MediaEvent> {
        self.rx.recv().ok()
    }
}
