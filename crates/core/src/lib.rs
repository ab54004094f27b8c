#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod progress;
pub mod time;

pub use error::Error;
pub use progress::{
    course_progress, mark_lesson_complete, navigation_context, CourseAction, LessonStatus,
    NavigationContext, ProgressError, ProgressSnapshot,
};
pub use time::Clock;
