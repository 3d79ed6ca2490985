//! Render-ready view of the playback section
//!
//! These types carry everything a front end needs to draw the section and
//! nothing it would have to compute itself.

use crate::course::{AttachmentKind, LectureKind};
use crate::player::VideoQuality;
use std::fmt;

pub const EMPTY_STATE_HEADING: &str = "Select a lecture to start learning";
pub const EMPTY_STATE_HINT: &str = "Choose from the course content on the right";

/// The whole section
#[derive(Debug, Clone, PartialEq)]
pub enum SectionView {
    /// No lecture selected
    Empty { heading: String, hint: String },

    /// A lecture is bound
    Player(Box<PlayerView>),
}

/// Section contents while a lecture is bound
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub source: String,
    pub overlay: Overlay,
    pub controls: ControlsView,
    pub navigation: NavigationArrows,
    pub metadata: LectureMetadata,
    pub attachments: Vec<AttachmentLink>,
}

/// Full-surface overlay above the video; at most one is shown
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    None,
    Loading,
    Error(String),
}

/// Control bar contents
#[derive(Debug, Clone, PartialEq)]
pub struct ControlsView {
    pub visible: bool,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub elapsed_label: String,
    pub duration_label: String,
    pub volume: f64,
    pub is_muted: bool,
    pub playback_rate: f64,
    pub quality: VideoQuality,
    pub available_qualities: Vec<VideoQuality>,
    pub captions_enabled: bool,
}

/// Previous/next lecture arrows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavigationArrows {
    pub can_go_previous: bool,
    pub can_go_next: bool,
    /// Empty when there is no previous lecture
    pub previous_title: String,
    /// Empty when there is no next lecture
    pub next_title: String,
}

/// Lecture details shown under the video
#[derive(Debug, Clone, PartialEq)]
pub struct LectureMetadata {
    pub title: String,
    pub description: Option<String>,
    pub label: String,
    /// "M:SS", absent when the lecture length is unknown
    pub length_label: Option<String>,
    pub kind: LectureKind,
    pub completed: bool,
}

/// One course-material link
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentLink {
    pub title: String,
    pub description: Option<String>,
    pub kind: AttachmentKind,
    pub file_size: Option<String>,
    pub href: String,
}

impl fmt::Display for SectionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionView::Empty { heading, hint } => write!(f, "{}\n{}", heading, hint),
            SectionView::Player(view) => write!(f, "{}", view),
        }
    }
}

impl fmt::Display for PlayerView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = &self.metadata;
        write!(f, "{}  [{}", meta.title, meta.label)?;
        if let Some(length) = &meta.length_label {
            write!(f, " | {}", length)?;
        }
        write!(f, " | {}", meta.kind.as_str())?;
        if meta.completed {
            write!(f, " | completed")?;
        }
        writeln!(f, "]")?;
        if let Some(description) = &meta.description {
            writeln!(f, "  {}", description)?;
        }

        match &self.overlay {
            Overlay::Loading => writeln!(f, "  Loading video...")?,
            Overlay::Error(message) => writeln!(f, "  ! {}", message)?,
            Overlay::None => {}
        }

        let c = &self.controls;
        writeln!(
            f,
            "  {} {} / {}  vol {:.0}%{}  {}x  {}{}",
            if c.is_playing { "||" } else { ">" },
            c.elapsed_label,
            c.duration_label,
            c.volume * 100.0,
            if c.is_muted { " (muted)" } else { "" },
            c.playback_rate,
            c.quality,
            if c.captions_enabled { "  CC" } else { "" },
        )?;

        let nav = &self.navigation;
        write!(f, "  ")?;
        if nav.can_go_previous {
            write!(f, "< {}", nav.previous_title)?;
        }
        if nav.can_go_previous && nav.can_go_next {
            write!(f, "  |  ")?;
        }
        if nav.can_go_next {
            write!(f, "{} >", nav.next_title)?;
        }

        for link in &self.attachments {
            write!(f, "\n  - {} ({}) {}", link.title, link.kind.as_str(), link.href)?;
            if let Some(size) = &link.file_size {
                write!(f, " [{}]", size)?;
            }
        }
        Ok(())
    }
}
