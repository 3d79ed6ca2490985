//! Keyboard handling for the lecture player
//!
//! Host key presses arrive as [`KeyEvent`]s on a [`KeyDispatcher`]. The
//! player registers a listener while mounted and routes presses through
//! [`KeyboardRouter`] into playback [`Command`]s.

mod dispatch;

pub use dispatch::{KeyDispatcher, KeyListener, KeySubscription};

use crate::player::Command;

/// Physical keys the player understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    KeyF,
    KeyM,
    Other,
}

impl KeyCode {
    /// Parse a DOM-style `code` string ("Space", "ArrowLeft", "KeyF")
    pub fn from_code(code: &str) -> KeyCode {
        match code {
            "Space" => KeyCode::Space,
            "ArrowLeft" => KeyCode::ArrowLeft,
            "ArrowRight" => KeyCode::ArrowRight,
            "ArrowUp" => KeyCode::ArrowUp,
            "ArrowDown" => KeyCode::ArrowDown,
            "KeyF" => KeyCode::KeyF,
            "KeyM" => KeyCode::KeyM,
            _ => KeyCode::Other,
        }
    }
}

/// Modifier keys held during a press
///
/// Only Alt changes routing: Alt+Left/Right belong to the host's history
/// navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub alt: bool,
}

/// Element that had focus when the key was pressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusTarget {
    /// Page body, the player or any non-editable control
    #[default]
    Document,

    /// An editable text field
    TextInput,
}

/// A key-down event from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    /// Generated by the host's auto-repeat while the key is held
    pub repeat: bool,
    pub target: FocusTarget,
}

impl KeyEvent {
    /// A plain, first press on the document
    pub fn press(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::default(),
            repeat: false,
            target: FocusTarget::Document,
        }
    }

    pub fn with_alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.target = FocusTarget::TextInput;
        self
    }
}

/// Maps key presses to playback commands
#[derive(Debug, Clone)]
pub struct KeyboardRouter {
    volume_step: f64,
}

impl KeyboardRouter {
    pub fn new(volume_step: f64) -> Self {
        Self { volume_step }
    }

    /// Resolve a key press
    ///
    /// Returns `None` for presses inside text inputs, auto-repeats and
    /// unbound keys. A returned command means the host's default handling
    /// for the key must be suppressed.
    pub fn route(&self, event: &KeyEvent) -> Option<Command> {
        if event.target == FocusTarget::TextInput || event.repeat {
            return None;
        }

        match event.code {
            KeyCode::Space => Some(Command::TogglePlay),
            KeyCode::ArrowLeft if !event.modifiers.alt => Some(Command::SkipBackward),
            KeyCode::ArrowRight if !event.modifiers.alt => Some(Command::SkipForward),
            KeyCode::KeyF => Some(Command::ToggleFullscreen),
            KeyCode::KeyM => Some(Command::ToggleMute),
            KeyCode::ArrowUp => Some(Command::StepVolume(self.volume_step)),
            KeyCode::ArrowDown => Some(Command::StepVolume(-self.volume_step)),
            _ => None,
        }
    }
}

impl Default for KeyboardRouter {
    fn default() -> Self {
        Self::new(0.1)
    }
}
