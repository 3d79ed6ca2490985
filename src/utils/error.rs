//! Error types for the lecture player
//!
//! Library code returns [`LecturePlayerError`] through the crate [`Result`]
//! alias. The binary wraps everything in `anyhow` at the top level.

use thiserror::Error;

/// Main error type for the lecture player
#[derive(Error, Debug)]
pub enum LecturePlayerError {
    /// Media adapter errors
    #[error("Media error: {0}")]
    Media(String),

    /// Preference storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Course catalogue errors
    #[error("Course error: {0}")]
    Course(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for LecturePlayerError {
    fn from(err: serde_json::Error) -> Self {
        LecturePlayerError::Course(format!("JSON error: {}", err))
    }
}

/// Convenience type alias for Results in the lecture player
pub type Result<T> = std::result::Result<T, LecturePlayerError>;

/// Extension trait for converting other errors to LecturePlayerError
pub trait ResultExt<T> {
    /// Convert this error into a storage error with the given context
    fn storage_err(self, context: &str) -> Result<T>;
    fn config_err(self, context: &str) -> Result<T>;
    fn course_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn storage_err(self, context: &str) -> Result<T> {
        self.map_err(|e| LecturePlayerError::Storage(format!("{}: {}", context, e)))
    }

    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| LecturePlayerError::Config(format!("{}: {}", context, e)))
    }

    fn course_err(self, context: &str) -> Result<T> {
        self.map_err(|e| LecturePlayerError::Course(format!("{}: {}", context, e)))
    }
}
