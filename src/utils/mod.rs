//! Utility module for the lecture player
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management
//! - Time label formatting for the player view

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{Config, GeneralConfig, StorageBackend, StorageConfig};
pub use error::{LecturePlayerError, Result, ResultExt};

/// Format a playback position for the controls bar
///
/// Produces "M:SS" below one hour and "H:MM:SS" above. Negative and
/// non-finite inputs render as "0:00".
pub fn format_timestamp(seconds: f64) -> String {
    let total_secs = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format a lecture length in whole seconds as "M:SS"
///
/// Minutes are not rolled over into hours, matching the course catalogue
/// listing (a 75 minute lecture reads "75:00").
pub fn format_lecture_length(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
