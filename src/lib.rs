//! Lecture Player - playback controller for course video lectures
//!
//! The crate drives a media element from user commands, tracks observable
//! playback state, remembers the viewer's volume, auto-advances between
//! lectures and renders the playback section as a plain view model.

pub mod course;
pub mod input;
pub mod media;
pub mod player;
pub mod storage;
pub mod utils;

pub use course::{Course, CourseNavigator, Lecture, NavigationProvider};
pub use input::{KeyCode, KeyDispatcher, KeyEvent, KeyboardRouter};
pub use media::{MediaElement, MediaEvent, SimulatedMedia};
pub use player::{
    Command, PlaybackSection, PlaybackState, PlayerConfig, SectionBuilder, SectionHandler,
    SectionView,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use utils::{Config, LecturePlayerError, Result};
