//! Course catalogue and lecture navigation
//!
//! Lectures are supplied by a [`NavigationProvider`] and shared as
//! `Arc<Lecture>`; the player references the current lecture and never
//! copies or mutates it.

mod navigator;

pub use navigator::CourseNavigator;

use crate::utils::error::{Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// What a lecture contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LectureKind {
    Video,
    Quiz,
    #[serde(other)]
    Other,
}

impl LectureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LectureKind::Video => "video",
            LectureKind::Quiz => "quiz",
            LectureKind::Other => "other",
        }
    }
}

/// What an attachment links to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Quiz,
    Downloadable,
    #[serde(other)]
    Other,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Quiz => "quiz",
            AttachmentKind::Downloadable => "downloadable",
            AttachmentKind::Other => "other",
        }
    }
}

/// Supplementary material listed under a lecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    /// Human-readable size such as "2.4 MB"
    #[serde(default)]
    pub file_size: Option<String>,
}

impl Attachment {
    /// Route the attachment link opens, keyed by lecture and attachment
    pub fn href(&self, lecture_id: u64) -> String {
        match self.kind {
            AttachmentKind::Quiz => format!("/quiz/{}/{}", lecture_id, self.id),
            _ => format!("/attachment/{}/{}", lecture_id, self.id),
        }
    }
}

/// A single lecture in a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Media source locator
    #[serde(default)]
    pub video_url: Option<String>,
    /// Length in whole seconds
    #[serde(default)]
    pub duration: u32,
    #[serde(rename = "type")]
    pub kind: LectureKind,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A course catalogue file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(default)]
    pub title: String,
    pub lectures: Vec<Lecture>,
}

impl Course {
    /// Read a course from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).course_err("Failed to read course file")?;
        Self::from_json(&data)
    }

    /// Parse a course from JSON text
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// Source of lecture ordering and transitions
///
/// Transitions take `&self`: providers are shared between the player and
/// the host and manage their own interior state.
pub trait NavigationProvider: Send + Sync {
    /// Index of the active lecture in [`NavigationProvider::all_lectures`]
    fn current_index(&self) -> usize;

    /// Every lecture, in course order
    fn all_lectures(&self) -> Vec<Arc<Lecture>>;

    /// Move to the following lecture, if any
    fn go_to_next_lecture(&self);

    /// Move to the preceding lecture, if any
    fn go_to_previous_lecture(&self);

    /// The active lecture
    fn current_lecture(&self) -> Option<Arc<Lecture>> {
        self.all_lectures().get(self.current_index()).cloned()
    }
}
