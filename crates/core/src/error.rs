use thiserror::Error;

use crate::model::{CourseError, LessonError};
use crate::progress::ProgressError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
