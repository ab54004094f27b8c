mod completion;
mod course;
mod ids;
mod lesson;

pub use completion::CompletionSet;
pub use course::{Course, CourseError};
pub use ids::{CourseId, LessonId, ParseIdError, UserId};
pub use lesson::{Lesson, LessonError, VideoUrl};
