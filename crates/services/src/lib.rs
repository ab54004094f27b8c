#![forbid(unsafe_code)]

pub mod course_service;
pub mod error;
pub mod lesson_service;
pub mod progress_service;

pub use lms_core::Clock;

pub use course_service::{CourseOverview, CourseService};
pub use error::{CourseServiceError, LessonServiceError, ProgressServiceError};
pub use lesson_service::{LessonService, LessonView};
pub use progress_service::{MarkCompleteOutcome, ProgressService, UserCourseProgress};
