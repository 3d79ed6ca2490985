//! Playback section
//!
//! [`PlaybackSection`] is the mounted form of the player: it owns the
//! controller for the active lecture, listens for document key presses,
//! and renders a [`SectionView`] for the host to draw.

use crate::course::{Lecture, NavigationProvider};
use crate::input::{KeyDispatcher, KeySubscription, KeyboardRouter};
use crate::media::MediaElement;
use crate::player::controller::media_source;
use crate::player::view::{EMPTY_STATE_HEADING, EMPTY_STATE_HINT};
use crate::player::{
    AttachmentLink, Command, ControlsView, LectureMetadata, NavigationArrows, Overlay,
    PlaybackController, PlaybackState, PlayerConfig, PlayerView, SectionHandler, SectionView,
};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::utils::{format_lecture_length, format_timestamp};
use crossbeam_channel::{unbounded, Receiver};
use log::{debug, info};
use std::sync::Arc;

/// Builder for a [`PlaybackSection`]
pub struct SectionBuilder {
    navigation: Arc<dyn NavigationProvider>,
    handler: Arc<dyn SectionHandler>,
    storage: Option<Arc<dyn KeyValueStore>>,
    config: PlayerConfig,
    lecture: Option<Arc<Lecture>>,
    completed: bool,
}

impl SectionBuilder {
    pub fn new(navigation: Arc<dyn NavigationProvider>, handler: Arc<dyn SectionHandler>) -> Self {
        Self {
            navigation,
            handler,
            storage: None,
            config: PlayerConfig::default(),
            lecture: None,
            completed: false,
        }
    }

    /// Set player configuration
    pub fn with_config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `storage` for preferences. Defaults to an in-memory store.
    pub fn with_storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Lecture to bind at mount, or `None` for the empty state
    pub fn with_lecture(mut self, lecture: Option<Arc<Lecture>>) -> Self {
        self.lecture = lecture;
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Mount the section over `media` and start listening on `keys`
    pub fn mount(self, media: Box<dyn MediaElement>, keys: &KeyDispatcher) -> PlaybackSection {
        let (tx, rx) = unbounded();
        let router = KeyboardRouter::new(self.config.volume_step);
        let subscription = keys.subscribe(move |event| match router.route(event) {
            Some(command) => {
                // A closed queue means the section is gone; still swallow the key
                let _ = tx.send(command);
                true
            }
            None => false,
        });

        let mut section = PlaybackSection {
            keys: Some(subscription),
            commands: rx,
            controller: None,
            media: Some(media),
            lecture: None,
            is_completed: self.completed,
            show_controls: true,
            navigation: self.navigation,
            handler: self.handler,
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>),
            config: self.config,
        };

        info!("Playback section mounted");
        section.set_lecture(self.lecture);
        section
    }
}

/// A mounted playback section
pub struct PlaybackSection {
    keys: Option<KeySubscription>,
    commands: Receiver<Command>,
    controller: Option<PlaybackController>,
    /// Element waiting for the first lecture
    media: Option<Box<dyn MediaElement>>,
    lecture: Option<Arc<Lecture>>,
    is_completed: bool,
    show_controls: bool,
    navigation: Arc<dyn NavigationProvider>,
    handler: Arc<dyn SectionHandler>,
    storage: Arc<dyn KeyValueStore>,
    config: PlayerConfig,
}

impl PlaybackSection {
    /// The bound lecture
    pub fn lecture(&self) -> Option<&Arc<Lecture>> {
        self.lecture.as_ref()
    }

    /// Playback state, present once a lecture has been bound
    pub fn state(&self) -> Option<&PlaybackState> {
        self.controller.as_ref().map(PlaybackController::state)
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn auto_advance_pending(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(PlaybackController::auto_advance_pending)
    }

    /// Switch the bound lecture
    ///
    /// Passing the lecture that is already bound changes nothing; playback
    /// position and state are kept.
    pub fn set_lecture(&mut self, lecture: Option<Arc<Lecture>>) {
        let unchanged = match (&self.lecture, &lecture) {
            (Some(current), Some(next)) => current.id == next.id,
            (None, None) => true,
            _ => false,
        };
        self.lecture = lecture;
        if unchanged {
            return;
        }

        match self.lecture.clone() {
            Some(lecture) => {
                if self.controller.is_none() {
                    if let Some(media) = self.media.take() {
                        self.controller = Some(PlaybackController::new(
                            media,
                            Arc::clone(&self.storage),
                            Arc::clone(&self.handler),
                            self.config.clone(),
                        ));
                    }
                }
                if let Some(controller) = self.controller.as_mut() {
                    controller.load_lecture(&lecture);
                }
            }
            None => {
                debug!("No lecture selected");
                if let Some(controller) = self.controller.as_mut() {
                    controller.unload();
                }
            }
        }
    }

    /// Bind whatever the navigation provider reports as current
    pub fn sync_with_navigation(&mut self) {
        let current = self.navigation.current_lecture();
        self.set_lecture(current);
    }

    /// Next-lecture arrow
    pub fn go_to_next(&mut self) {
        self.navigation.go_to_next_lecture();
        self.sync_with_navigation();
    }

    /// Previous-lecture arrow
    pub fn go_to_previous(&mut self) {
        self.navigation.go_to_previous_lecture();
        self.sync_with_navigation();
    }

    /// Process delivered media events and queued key commands
    ///
    /// Media events already delivered are applied before each command, so
    /// commands act on the position and play state the viewer saw.
    /// Returns the number of commands and events handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = self.pump_media_events();
        while let Ok(command) = self.commands.try_recv() {
            handled += self.run_command(command) + 1;
        }
        handled + self.pump_media_events()
    }

    /// Execute a command from the on-screen controls
    pub fn execute(&mut self, command: Command) {
        self.run_command(command);
    }

    /// Catch up on media events, then execute `command`
    fn run_command(&mut self, command: Command) -> usize {
        if self.lecture.is_none() {
            debug!("Ignoring {:?} without a lecture", command);
            return 0;
        }
        let Some(controller) = self.controller.as_mut() else {
            return 0;
        };
        let applied = controller.pump_media_events();
        controller.execute(command);
        applied
    }

    fn pump_media_events(&mut self) -> usize {
        self.controller
            .as_mut()
            .map_or(0, PlaybackController::pump_media_events)
    }

    /// "Mark as complete" button
    pub fn mark_complete(&self) {
        self.handler.on_mark_complete();
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.is_completed = completed;
    }

    /// Pointer entered or left the video surface
    pub fn set_pointer_over(&mut self, over: bool) {
        self.show_controls = over;
    }

    /// Build the view for the current state
    pub fn render(&self) -> SectionView {
        let Some(lecture) = self.lecture.as_ref() else {
            return SectionView::Empty {
                heading: EMPTY_STATE_HEADING.to_string(),
                hint: EMPTY_STATE_HINT.to_string(),
            };
        };

        let state = self.state().cloned().unwrap_or_default();
        let overlay = if state.is_loading {
            Overlay::Loading
        } else if let Some(message) = &state.error {
            Overlay::Error(message.clone())
        } else {
            Overlay::None
        };

        let controls = ControlsView {
            visible: self.show_controls,
            is_playing: state.is_playing,
            current_time: state.current_time,
            duration: state.duration,
            elapsed_label: format_timestamp(state.current_time),
            duration_label: format_timestamp(state.duration),
            volume: state.volume,
            is_muted: state.is_muted,
            playback_rate: state.playback_rate,
            quality: state.video_quality,
            available_qualities: self.config.available_qualities.clone(),
            captions_enabled: state.captions_enabled,
        };

        let metadata = LectureMetadata {
            title: lecture.title.clone(),
            description: lecture.description.clone(),
            label: format!("Lecture {}", lecture.id),
            length_label: (lecture.duration > 0).then(|| format_lecture_length(lecture.duration)),
            kind: lecture.kind,
            completed: self.is_completed,
        };

        let attachments = lecture
            .attachments
            .iter()
            .map(|attachment| AttachmentLink {
                title: attachment.title.clone(),
                description: attachment.description.clone(),
                kind: attachment.kind,
                file_size: attachment.file_size.clone(),
                href: attachment.href(lecture.id),
            })
            .collect();

        SectionView::Player(Box::new(PlayerView {
            source: media_source(lecture, &self.config).to_string(),
            overlay,
            controls,
            navigation: self.navigation_arrows(),
            metadata,
            attachments,
        }))
    }

    fn navigation_arrows(&self) -> NavigationArrows {
        let lectures = self.navigation.all_lectures();
        let index = self.navigation.current_index();
        let mut arrows = NavigationArrows::default();

        if index > 0 {
            if let Some(previous) = lectures.get(index - 1) {
                arrows.can_go_previous = true;
                arrows.previous_title = previous.title.clone();
            }
        }
        if let Some(next) = lectures.get(index + 1) {
            arrows.can_go_next = true;
            arrows.next_title = next.title.clone();
        }
        arrows
    }

    /// Stop listening for keys and release the media element
    pub fn unmount(self) {}
}

impl Drop for PlaybackSection {
    fn drop(&mut self) {
        // Keys first so nothing is queued against a dead controller
        self.keys.take();
        if let Some(controller) = self.controller.as_mut() {
            controller.teardown();
        }
        info!("Playback section unmounted");
    }
}

impl std::fmt::Debug for PlaybackSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSection")
            .field("lecture", &self.lecture.as_ref().map(|l| l.id))
            .field("is_completed", &self.is_completed)
            .field("show_controls", &self.show_controls)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Attachment, AttachmentKind, CourseNavigator, LectureKind};
    use crate::input::{KeyCode, KeyEvent};
    use crate::media::{AdapterCall, SimulatedHandle, SimulatedMedia};
    use crate::player::PLACEHOLDER_SOURCE;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        completed: Mutex<usize>,
        ended: Mutex<usize>,
    }

    impl SectionHandler for Recorder {
        fn on_next(&self) {}

        fn on_previous(&self) {}

        fn on_mark_complete(&self) {
            *self.completed.lock() += 1;
        }

        fn on_video_end(&self) {
            *self.ended.lock() += 1;
        }
    }

    fn lecture(id: u64, url: Option<&str>) -> Lecture {
        Lecture {
            id,
            title: format!("Lecture title {}", id),
            description: Some(format!("About {}", id)),
            video_url: url.map(str::to_string),
            duration: 754,
            kind: LectureKind::Video,
            attachments: Vec::new(),
        }
    }

    struct Fixture {
        section: PlaybackSection,
        handle: SimulatedHandle,
        navigator: Arc<CourseNavigator>,
        recorder: Arc<Recorder>,
        keys: KeyDispatcher,
    }

    fn mount(select: Option<usize>) -> Fixture {
        let navigator = Arc::new(CourseNavigator::new(vec![
            lecture(1, Some("https://cdn.example.com/1.mp4")),
            lecture(2, None),
            lecture(3, Some("https://cdn.example.com/3.mp4")),
        ]));
        let recorder = Arc::new(Recorder::default());
        let keys = KeyDispatcher::new();
        let (media, handle) = SimulatedMedia::new();

        let current = select.and_then(|index| {
            navigator.select(index);
            navigator.current_lecture()
        });
        let section = SectionBuilder::new(
            Arc::clone(&navigator) as Arc<dyn NavigationProvider>,
            Arc::clone(&recorder) as Arc<dyn SectionHandler>,
        )
        .with_lecture(current)
        .mount(Box::new(media), &keys);

        Fixture {
            section,
            handle,
            navigator,
            recorder,
            keys,
        }
    }

    fn player_view(section: &PlaybackSection) -> PlayerView {
        match section.render() {
            SectionView::Player(view) => *view,
            other => panic!("expected player view, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_state_binds_nothing() {
        let fx = mount(None);
        assert_eq!(
            fx.section.render(),
            SectionView::Empty {
                heading: EMPTY_STATE_HEADING.to_string(),
                hint: EMPTY_STATE_HINT.to_string(),
            }
        );
        assert!(fx.section.state().is_none());
        assert!(!fx.handle.is_bound());
        assert!(fx.handle.calls().is_empty());
    }

    #[test]
    fn test_binds_lecture_source() {
        let mut fx = mount(Some(0));
        assert_eq!(fx.handle.source().as_deref(), Some("https://cdn.example.com/1.mp4"));

        fx.section.pump();
        assert_eq!(player_view(&fx.section).overlay, Overlay::Loading);

        fx.handle.ready(120.0);
        fx.section.pump();
        let view = player_view(&fx.section);
        assert_eq!(view.overlay, Overlay::None);
        assert_eq!(view.controls.duration_label, "2:00");
        assert!(view.controls.visible);
    }

    #[test]
    fn test_placeholder_source() {
        let fx = mount(Some(1));
        assert_eq!(fx.handle.source().as_deref(), Some(PLACEHOLDER_SOURCE));
        assert_eq!(player_view(&fx.section).source, PLACEHOLDER_SOURCE);
    }

    #[test]
    fn test_error_overlay() {
        let mut fx = mount(Some(0));
        fx.section.pump();
        fx.handle.fail("Failed to load video");
        fx.section.pump();
        assert_eq!(
            player_view(&fx.section).overlay,
            Overlay::Error("Failed to load video".to_string())
        );
    }

    #[test]
    fn test_navigation_arrows() {
        let fx = mount(Some(0));
        let arrows = player_view(&fx.section).navigation;
        assert!(!arrows.can_go_previous);
        assert!(arrows.can_go_next);
        assert_eq!(arrows.next_title, "Lecture title 2");

        let mut fx = mount(Some(2));
        let arrows = player_view(&fx.section).navigation;
        assert!(arrows.can_go_previous);
        assert!(!arrows.can_go_next);
        assert_eq!(arrows.previous_title, "Lecture title 2");

        fx.section.go_to_previous();
        assert_eq!(fx.navigator.current_index(), 1);
        assert_eq!(fx.section.lecture().map(|l| l.id), Some(2));
        let arrows = player_view(&fx.section).navigation;
        assert!(arrows.can_go_previous && arrows.can_go_next);
    }

    #[test]
    fn test_metadata_and_attachments() {
        let navigator = Arc::new(CourseNavigator::new(vec![Lecture {
            attachments: vec![
                Attachment {
                    id: 7,
                    title: "Checkpoint".to_string(),
                    description: None,
                    kind: AttachmentKind::Quiz,
                    file_size: None,
                },
                Attachment {
                    id: 8,
                    title: "Slides".to_string(),
                    description: Some("PDF".to_string()),
                    kind: AttachmentKind::Downloadable,
                    file_size: Some("2.4 MB".to_string()),
                },
            ],
            duration: 0,
            ..lecture(5, None)
        }]));
        let (media, _handle) = SimulatedMedia::new();
        let mut section = SectionBuilder::new(
            Arc::clone(&navigator) as Arc<dyn NavigationProvider>,
            Arc::new(Recorder::default()) as Arc<dyn SectionHandler>,
        )
        .with_lecture(navigator.current_lecture())
        .completed(true)
        .mount(Box::new(media), &KeyDispatcher::new());

        let view = player_view(&section);
        assert_eq!(view.metadata.label, "Lecture 5");
        assert_eq!(view.metadata.length_label, None);
        assert!(view.metadata.completed);
        assert_eq!(view.attachments[0].href, "/quiz/5/7");
        assert_eq!(view.attachments[1].href, "/attachment/5/8");
        assert_eq!(view.attachments[1].file_size.as_deref(), Some("2.4 MB"));

        section.set_completed(false);
        section.set_pointer_over(false);
        let view = player_view(&section);
        assert!(!view.metadata.completed);
        assert!(!view.controls.visible);
    }

    #[test]
    fn test_length_label() {
        let fx = mount(Some(0));
        assert_eq!(
            player_view(&fx.section).metadata.length_label.as_deref(),
            Some("12:34")
        );
    }

    #[test]
    fn test_same_lecture_keeps_position() {
        let mut fx = mount(Some(0));
        fx.handle.ready(120.0);
        fx.section.pump();
        fx.section.execute(Command::SeekTo(42.0));
        fx.section.pump();
        fx.handle.clear_calls();

        let same = fx.navigator.current_lecture();
        fx.section.set_lecture(same);
        assert!(fx.handle.calls().is_empty());
        assert_eq!(fx.section.state().map(|s| s.current_time), Some(42.0));
    }

    #[test]
    fn test_lecture_cleared_unloads() {
        let mut fx = mount(Some(0));
        fx.handle.ready(120.0);
        fx.section.execute(Command::TogglePlay);
        fx.section.pump();
        assert!(fx.handle.is_playing());

        fx.section.set_lecture(None);
        assert!(!fx.handle.is_playing());
        assert!(!fx.handle.is_bound());
        assert!(matches!(fx.section.render(), SectionView::Empty { .. }));

        fx.section.set_lecture(fx.navigator.current_lecture());
        assert!(fx.handle.is_bound());
    }

    #[test]
    fn test_skip_uses_position_delivered_before_key() {
        let mut fx = mount(Some(0));
        fx.handle.ready(120.0);
        fx.section.execute(Command::TogglePlay);
        fx.section.pump();

        fx.handle.tick(50.0);
        fx.keys.dispatch(&KeyEvent::press(KeyCode::ArrowRight));
        fx.section.pump();

        assert_eq!(fx.section.state().map(|s| s.current_time), Some(60.0));
        assert_eq!(fx.handle.position(), 60.0);
    }

    #[test]
    fn test_space_after_engine_paused_resumes() {
        let mut fx = mount(Some(0));
        fx.handle.ready(120.0);
        fx.section.execute(Command::TogglePlay);
        fx.section.pump();
        assert!(fx.handle.is_playing());

        // Runs past the end: the engine pauses itself and reports it
        fx.handle.tick(200.0);
        assert!(!fx.handle.is_playing());
        fx.keys.dispatch(&KeyEvent::press(KeyCode::Space));
        fx.section.pump();

        assert!(fx.handle.is_playing());
        assert_eq!(fx.section.state().map(|s| s.is_playing), Some(true));
    }

    #[test]
    fn test_direct_command_sees_delivered_events() {
        let mut fx = mount(Some(0));
        fx.handle.ready(120.0);
        fx.section.execute(Command::TogglePlay);
        fx.section.pump();

        fx.handle.tick(30.0);
        fx.section.execute(Command::SkipBackward);
        assert_eq!(fx.section.state().map(|s| s.current_time), Some(20.0));
    }

    #[test]
    fn test_keys_route_to_controller() {
        let mut fx = mount(Some(0));
        fx.handle.ready(120.0);
        fx.section.pump();

        assert!(fx.keys.dispatch(&KeyEvent::press(KeyCode::Space)));
        assert!(!fx.keys.dispatch(&KeyEvent::press(KeyCode::Space).repeated()));
        assert!(!fx.keys.dispatch(&KeyEvent::press(KeyCode::Other)));
        fx.section.pump();
        assert!(fx.handle.is_playing());
        assert_eq!(fx.section.state().map(|s| s.is_playing), Some(true));

        fx.keys.dispatch(&KeyEvent::press(KeyCode::ArrowDown));
        fx.section.pump();
        assert_eq!(fx.section.state().map(|s| s.volume), Some(0.9));
    }

    #[test]
    fn test_mark_complete() {
        let fx = mount(Some(0));
        fx.section.mark_complete();
        assert_eq!(*fx.recorder.completed.lock(), 1);
    }

    #[test]
    fn test_unmount_releases() {
        let mut fx = mount(Some(0));
        fx.handle.ready(120.0);
        fx.section.execute(Command::TogglePlay);
        fx.section.pump();
        assert_eq!(fx.keys.listener_count(), 1);

        fx.section.unmount();
        assert_eq!(fx.keys.listener_count(), 0);
        assert!(!fx.handle.is_playing());
        assert!(!fx.handle.is_bound());
        assert!(fx.handle.calls().contains(&AdapterCall::Release));
    }
}
