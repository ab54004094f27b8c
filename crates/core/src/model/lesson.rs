use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::model::ids::{CourseId, LessonId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("video URL is not a valid URL")]
    InvalidVideoUrl,
}

//
// ─── VIDEO URL ─────────────────────────────────────────────────────────────────
//

/// A lesson's video reference.
///
/// Well-formedness only: the URL is parsed but never fetched, and the choice
/// of embed vs. raw link is a rendering concern outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUrl(Url);

impl VideoUrl {
    /// Parses a video URL.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidVideoUrl` if the string is empty or not
    /// a parseable URL.
    pub fn parse(url: impl AsRef<str>) -> Result<Self, LessonError> {
        let s = url.as_ref().trim();
        if s.is_empty() {
            return Err(LessonError::InvalidVideoUrl);
        }
        let u = Url::parse(s).map_err(|_| LessonError::InvalidVideoUrl)?;
        Ok(Self(u))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A single lesson, optionally attached to a parent course.
///
/// A lesson without a parent course is an orphan: it renders on its own but
/// takes no part in any course's ordering, progress, or navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    course_id: Option<CourseId>,
    video_url: Option<VideoUrl>,
    sequence: u32,
    created_at: DateTime<Utc>,
}

impl Lesson {
    /// Creates a new Lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        course_id: Option<CourseId>,
        video_url: Option<VideoUrl>,
        sequence: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            course_id,
            video_url,
            sequence,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn course_id(&self) -> Option<CourseId> {
        self.course_id
    }

    #[must_use]
    pub fn video_url(&self) -> Option<&VideoUrl> {
        self.video_url.as_ref()
    }

    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Position ordering within a course: ascending sequence, title as
    /// tie-break, id as the final deterministic discriminator.
    #[must_use]
    pub fn course_order(a: &Lesson, b: &Lesson) -> Ordering {
        a.sequence
            .cmp(&b.sequence)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.id.cmp(&b.id))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
