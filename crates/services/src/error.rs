//! Shared error types for the services crate.

use thiserror::Error;

use lms_core::model::{CourseError, CourseId, LessonError, LessonId};
use lms_core::progress::ProgressError;
use storage::repository::StorageError;

/// Errors emitted by `CourseService`.
///
/// `CourseNotFound` is distinct from `Storage` so callers can render a page
/// without the course overlay instead of treating it as a hard failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
