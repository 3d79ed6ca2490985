//! In-memory lecture navigator

use crate::course::{Course, Lecture, NavigationProvider};
use log::info;
use parking_lot::RwLock;
use std::sync::Arc;

/// Ordered lecture list with a movable cursor
#[derive(Debug)]
pub struct CourseNavigator {
    lectures: Vec<Arc<Lecture>>,
    current_index: RwLock<usize>,
}

impl CourseNavigator {
    pub fn new(lectures: Vec<Lecture>) -> Self {
        Self {
            lectures: lectures.into_iter().map(Arc::new).collect(),
            current_index: RwLock::new(0),
        }
    }

    pub fn from_course(course: Course) -> Self {
        Self::new(course.lectures)
    }

    /// Jump to `index`. Out-of-range indices are ignored.
    pub fn select(&self, index: usize) -> bool {
        if index >= self.lectures.len() {
            return false;
        }
        *self.current_index.write() = index;
        true
    }

    pub fn len(&self) -> usize {
        self.lectures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lectures.is_empty()
    }
}

impl NavigationProvider for CourseNavigator {
    fn current_index(&self) -> usize {
        *self.current_index.read()
    }

    fn all_lectures(&self) -> Vec<Arc<Lecture>> {
        self.lectures.clone()
    }

    fn go_to_next_lecture(&self) {
        let mut index = self.current_index.write();
        if *index + 1 < self.lectures.len() {
            *index += 1;
            info!("Advanced to lecture {} of {}", *index + 1, self.lectures.len());
        }
    }

    fn go_to_previous_lecture(&self) {
        let mut index = self.current_index.write();
        if *index > 0 {
            *index -= 1;
            info!("Went back to lecture {} of {}", *index + 1, self.lectures.len());
        }
    }

    fn current_lecture(&self) -> Option<Arc<Lecture>> {
        self.lectures.get(*self.current_index.read()).cloned()
    }
}
