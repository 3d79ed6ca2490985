//! Integration test utilities for Lecture Player
//!
//! Provides a course file on disk, a recording section handler and a
//! harness that mounts a playback section over the simulated engine.

use anyhow::Result;
use lecture_player::course::{Course, CourseNavigator, NavigationProvider};
use lecture_player::input::KeyDispatcher;
use lecture_player::media::{SimulatedHandle, SimulatedMedia};
use lecture_player::player::{PlaybackSection, PlayerConfig, SectionBuilder, SectionHandler};
use lecture_player::storage::{FileStore, KeyValueStore};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Three lectures; the second has no media of its own
pub const COURSE_JSON: &str = r#"{
    "title": "Systems Programming",
    "lectures": [
        {
            "id": 101,
            "title": "Ownership",
            "description": "Moves, borrows and lifetimes",
            "videoUrl": "https://cdn.example.com/ownership.mp4",
            "duration": 754,
            "type": "video",
            "attachments": [
                { "id": 1, "title": "Ownership quiz", "type": "quiz" },
                { "id": 2, "title": "Slides", "type": "downloadable", "fileSize": "2.4 MB" }
            ]
        },
        {
            "id": 102,
            "title": "Traits",
            "duration": 0,
            "type": "video"
        },
        {
            "id": 103,
            "title": "Checkpoint",
            "videoUrl": "https://cdn.example.com/checkpoint.mp4",
            "duration": 65,
            "type": "quiz"
        }
    ]
}"#;

/// Callback recorded by [`RecordingHandler`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandlerCall {
    Next,
    Previous,
    MarkComplete,
    VideoEnd,
}

/// Section handler that records every callback
#[derive(Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<HandlerCall>>,
}

impl RecordingHandler {
    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: HandlerCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }
}

impl SectionHandler for RecordingHandler {
    fn on_next(&self) {
        self.calls.lock().push(HandlerCall::Next);
    }

    fn on_previous(&self) {
        self.calls.lock().push(HandlerCall::Previous);
    }

    fn on_mark_complete(&self) {
        self.calls.lock().push(HandlerCall::MarkComplete);
    }

    fn on_video_end(&self) {
        self.calls.lock().push(HandlerCall::VideoEnd);
    }
}

/// Temporary directory holding the course file and the preferences file
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub course_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let course_path = temp_dir.path().join("course.json");
        std::fs::write(&course_path, COURSE_JSON)?;
        Ok(Self {
            temp_dir,
            course_path,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.path().join("preferences.json")
    }

    /// Open the on-disk preference store
    pub fn storage(&self) -> Result<Arc<dyn KeyValueStore>> {
        Ok(Arc::new(FileStore::open(self.preferences_path())?))
    }

    /// Load the course navigator from disk
    pub fn navigator(&self) -> Result<Arc<CourseNavigator>> {
        let course = Course::from_file(&self.course_path)?;
        Ok(Arc::new(CourseNavigator::from_course(course)))
    }
}

/// A mounted section with everything a test needs to drive it
pub struct Harness {
    pub section: PlaybackSection,
    pub engine: SimulatedHandle,
    pub keys: KeyDispatcher,
    pub navigator: Arc<CourseNavigator>,
    pub handler: Arc<RecordingHandler>,
}

impl Harness {
    /// Mount over the fixture's course and preferences, at `index`
    pub fn mount(fixture: &TestFixture, index: Option<usize>) -> Result<Self> {
        Self::mount_with(fixture, index, PlayerConfig::default())
    }

    pub fn mount_with(fixture: &TestFixture, index: Option<usize>, config: PlayerConfig) -> Result<Self> {
        let navigator = fixture.navigator()?;
        let lecture = match index {
            Some(index) => {
                anyhow::ensure!(navigator.select(index), "no lecture at {}", index);
                navigator.current_lecture()
            }
            None => None,
        };

        let handler = Arc::new(RecordingHandler::default());
        let keys = KeyDispatcher::new();
        let (media, engine) = SimulatedMedia::new();
        let section = SectionBuilder::new(
            Arc::clone(&navigator) as Arc<dyn NavigationProvider>,
            Arc::clone(&handler) as Arc<dyn SectionHandler>,
        )
        .with_config(config)
        .with_storage(fixture.storage()?)
        .with_lecture(lecture)
        .mount(Box::new(media), &keys);

        Ok(Self {
            section,
            engine,
            keys,
            navigator,
            handler,
        })
    }

    /// Finish loading with the given duration
    pub fn ready(&mut self, duration: f64) {
        self.section.pump();
        self.engine.ready(duration);
        self.section.pump();
    }

    /// Follow the navigator, as a host does after `on_next`
    pub fn follow_navigation(&mut self) {
        self.section.sync_with_navigation();
        self.section.pump();
    }
}
