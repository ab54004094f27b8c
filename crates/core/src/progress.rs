//! Progress and navigation computations over a course's ordered lessons.
//!
//! Everything here is a stateless, deterministic function of its inputs: the
//! ordered lesson list comes from the content store, the completion set from
//! the user-record store, and callers persist whatever comes back.

use thiserror::Error;

use crate::model::{CompletionSet, Lesson, LessonId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    /// The lesson's stored parent reference and the course's lesson
    /// enumeration disagree. Surfaced rather than papered over.
    #[error("lesson {0} is not part of the course's lesson ordering")]
    OrderingMismatch(LessonId),

    #[error("invalid lesson id: {0}")]
    InvalidLessonId(LessonId),

    #[error("invalid user id: {0}")]
    InvalidUserId(UserId),
}

//
// ─── DERIVED VIEWS ─────────────────────────────────────────────────────────────
//

/// One lesson in course order with the viewer's completion flag.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonStatus {
    pub lesson: Lesson,
    pub completed: bool,
}

/// The course page's call-to-action.
///
/// `Start` and `Continue` both point at the first incomplete lesson in
/// order; they are distinct so the caller can label the button. A fully
/// completed (or empty) course has no action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAction {
    Start(LessonId),
    Continue(LessonId),
}

impl CourseAction {
    #[must_use]
    pub fn target(self) -> LessonId {
        match self {
            CourseAction::Start(id) | CourseAction::Continue(id) => id,
        }
    }
}

/// Aggregate progress for one (user, course) pair. Recomputed per render,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub completed: usize,
    /// Exact `completed / total * 100`, 0 for an empty course. Rounding is
    /// the caller's presentation concern.
    pub percentage: f64,
    pub lessons: Vec<LessonStatus>,
    pub action: Option<CourseAction>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Where one lesson sits within its course: 1-based position plus its
/// neighbors. `next == None` means the lesson is last, unambiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationContext {
    pub position: usize,
    pub total: usize,
    pub previous: Option<Lesson>,
    pub next: Option<Lesson>,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Computes a course's progress snapshot for one viewer.
///
/// `lessons` must already be in course order (the content store sorts by
/// sequence then title). Completion entries for lessons outside the list are
/// simply ignored.
#[must_use]
pub fn course_progress(lessons: &[Lesson], completed: &CompletionSet) -> ProgressSnapshot {
    let statuses: Vec<LessonStatus> = lessons
        .iter()
        .map(|lesson| LessonStatus {
            completed: completed.contains(lesson.id()),
            lesson: lesson.clone(),
        })
        .collect();

    let total = statuses.len();
    let completed_count = statuses.iter().filter(|s| s.completed).count();
    let percentage = if total > 0 {
        (completed_count as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    // Integer comparisons here, never float equality on `percentage`.
    let action = if total == 0 || completed_count == total {
        None
    } else if completed_count == 0 {
        statuses
            .first()
            .map(|s| CourseAction::Start(s.lesson.id()))
    } else {
        // First incomplete lesson in order: "continue where you left off".
        statuses
            .iter()
            .find(|s| !s.completed)
            .map(|s| CourseAction::Continue(s.lesson.id()))
    };

    ProgressSnapshot {
        total,
        completed: completed_count,
        percentage,
        lessons: statuses,
        action,
    }
}

/// Locates a lesson within its course's ordered list and derives prev/next
/// navigation.
///
/// # Errors
///
/// Returns `ProgressError::OrderingMismatch` when the lesson id does not
/// appear in `lessons`: a data-consistency problem, never an out-of-range
/// read.
pub fn navigation_context(
    lesson_id: LessonId,
    lessons: &[Lesson],
) -> Result<NavigationContext, ProgressError> {
    let index = lessons
        .iter()
        .position(|l| l.id() == lesson_id)
        .ok_or(ProgressError::OrderingMismatch(lesson_id))?;

    let previous = if index > 0 {
        Some(lessons[index - 1].clone())
    } else {
        None
    };
    let next = lessons.get(index + 1).cloned();

    Ok(NavigationContext {
        position: index + 1,
        total: lessons.len(),
        previous,
        next,
    })
}

/// Returns a new completion set with the lesson marked complete.
///
/// Idempotent: re-marking an already-complete lesson yields an equal set.
/// The caller persists the returned value; nothing is mutated in place.
///
/// # Errors
///
/// Returns `ProgressError::InvalidUserId` / `InvalidLessonId` for
/// zero-valued identifiers. Existence checks belong to the boundary.
pub fn mark_lesson_complete(
    user_id: UserId,
    lesson_id: LessonId,
    completed: &CompletionSet,
) -> Result<CompletionSet, ProgressError> {
    if user_id.value() == 0 {
        return Err(ProgressError::InvalidUserId(user_id));
    }
    if lesson_id.value() == 0 {
        return Err(ProgressError::InvalidLessonId(lesson_id));
    }

    let mut updated = completed.clone();
    updated.insert(lesson_id);
    Ok(updated)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
