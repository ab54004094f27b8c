use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::CourseId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A course: a titled container for an ordered sequence of lessons.
///
/// The course itself carries no lesson list; lesson membership is a property
/// of the lessons (each names its parent course) and the ordered list is
/// produced by the content store.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Creates a new Course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
