use std::sync::Arc;

use serde::Serialize;

use lms_core::model::{CompletionSet, CourseId, LessonId, UserId};
use lms_core::progress;
use storage::repository::{CompletionRepository, CourseRepository, LessonRepository};

use crate::Clock;
use crate::error::ProgressServiceError;

/// Result of a completion mark, shaped for the transport boundary's success
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkCompleteOutcome {
    /// False when the lesson was already complete (double-click, retry).
    pub newly_completed: bool,
    /// The user's full completion set after the mark.
    pub completed_lessons: CompletionSet,
}

/// One row of the per-course progress report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserCourseProgress {
    pub user: UserId,
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Orchestrates completion marking and progress reporting.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    completions: Arc<dyn CompletionRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        completions: Arc<dyn CompletionRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            lessons,
            completions,
        }
    }

    /// Mark a lesson complete for a user.
    ///
    /// Authentication and the anti-forgery check happen at the transport
    /// boundary; this takes an already-trusted user id. Persistence goes
    /// through the storage layer's atomic set-member insert, so concurrent
    /// marks for the same pair cannot lose updates and the whole call is
    /// safe to retry.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::LessonNotFound` for an unknown lesson,
    /// `Progress` for invalid (zero) identifiers, `Storage` for repository
    /// failures.
    pub async fn mark_complete(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<MarkCompleteOutcome, ProgressServiceError> {
        self.lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(ProgressServiceError::LessonNotFound(lesson_id))?;

        let current = self.completions.completion_set(user_id).await?;
        let updated = progress::mark_lesson_complete(user_id, lesson_id, &current)?;

        let newly_completed = self
            .completions
            .add_completion(user_id, lesson_id, self.clock.now())
            .await?;

        Ok(MarkCompleteOutcome {
            newly_completed,
            completed_lessons: updated,
        })
    }

    /// Per-user progress for one course, for the reporting page.
    ///
    /// Users with no completed lesson in the course are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::CourseNotFound` for an unknown course,
    /// `Storage` for repository failures.
    pub async fn course_report(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<UserCourseProgress>, ProgressServiceError> {
        self.courses
            .get_course(course_id)
            .await?
            .ok_or(ProgressServiceError::CourseNotFound(course_id))?;

        let lessons = self.lessons.list_lessons_for_course(course_id).await?;
        let users = self.completions.users_with_completions().await?;

        let mut report = Vec::new();
        for user in users {
            let completed = self.completions.completion_set(user).await?;
            let snapshot = progress::course_progress(&lessons, &completed);
            if snapshot.completed == 0 {
                continue;
            }
            report.push(UserCourseProgress {
                user,
                completed: snapshot.completed,
                total: snapshot.total,
                percentage: snapshot.percentage,
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lms_core::progress::ProgressError;
    use lms_core::time::fixed_now;
    use storage::repository::{NewLessonRecord, Storage};

    fn service(storage: &Storage) -> ProgressService {
        ProgressService::new(
            Clock::Fixed(fixed_now()),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.completions),
        )
    }

    async fn seed_lesson(storage: &Storage) -> LessonId {
        let course_id = storage
            .courses
            .insert_new_course(storage::repository::NewCourseRecord {
                title: "Course".into(),
                description: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        storage
            .lessons
            .insert_new_lesson(NewLessonRecord {
                title: "L1".into(),
                course_id: Some(course_id),
                video_url: None,
                sequence: 1,
                created_at: fixed_now(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn mark_complete_persists_and_reports_first_time() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        let lesson = seed_lesson(&storage).await;
        let user = UserId::new(3);

        let outcome = service.mark_complete(user, lesson).await.unwrap();
        assert!(outcome.newly_completed);
        assert!(outcome.completed_lessons.contains(lesson));

        let outcome = service.mark_complete(user, lesson).await.unwrap();
        assert!(!outcome.newly_completed);
        assert_eq!(outcome.completed_lessons.len(), 1);

        let persisted = storage.completions.completion_set(user).await.unwrap();
        assert_eq!(persisted.len(), 1);
    }

    #[tokio::test]
    async fn mark_complete_rejects_zero_user_id() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        let lesson = seed_lesson(&storage).await;

        let err = service
            .mark_complete(UserId::new(0), lesson)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressServiceError::Progress(ProgressError::InvalidUserId(_))
        ));

        // Nothing persisted for the rejected mark.
        let persisted = storage
            .completions
            .completion_set(UserId::new(0))
            .await
            .unwrap();
        assert!(persisted.is_empty());
    }

    #[tokio::test]
    async fn course_report_for_missing_course_is_not_found() {
        let storage = Storage::in_memory();
        let service = service(&storage);

        let err = service.course_report(CourseId::new(9)).await.unwrap_err();
        assert!(matches!(err, ProgressServiceError::CourseNotFound(_)));
    }
}
