use std::sync::Arc;

use lms_core::model::{Course, CourseId, Lesson, LessonId, UserId, VideoUrl};
use lms_core::progress::{self, NavigationContext};
use storage::repository::{
    CompletionRepository, CourseRepository, LessonRepository, NewLessonRecord,
};

use crate::Clock;
use crate::error::LessonServiceError;

/// The lesson page's data: the lesson itself plus, when it belongs to a
/// course, its position and neighbors within that course.
///
/// `navigation == None` means the lesson is an orphan and the page renders
/// without the course overlay. When `navigation.next` is absent the caller
/// substitutes a back-to-course link; that fallback is presentation, not
/// part of this contract.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonView {
    pub lesson: Lesson,
    pub course: Option<Course>,
    pub navigation: Option<NavigationContext>,
    /// Whether the viewer has already completed this lesson.
    pub completed: bool,
}

/// Orchestrates lesson persistence and the lesson-page view.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    completions: Arc<dyn CompletionRepository>,
}

impl LessonService {
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

    /// Create a new lesson and persist it.
    ///
    /// When a parent course is named it must exist; the dangling-reference
    /// case the original tolerated is rejected here at the boundary.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::CourseNotFound` for an unknown parent,
    /// `Lesson` for validation failures, `Storage` if persistence fails.
    pub async fn create_lesson(
        &self,
        title: String,
        course_id: Option<CourseId>,
        video_url: Option<String>,
        sequence: u32,
    ) -> Result<LessonId, LessonServiceError> {
        if let Some(course_id) = course_id {
            self.courses
                .get_course(course_id)
                .await?
                .ok_or(LessonServiceError::CourseNotFound(course_id))?;
        }

        let video_url = video_url.map(VideoUrl::parse).transpose()?;
        let now = self.clock.now();
        let lesson = Lesson::new(LessonId::new(1), title, course_id, video_url, sequence, now)?;
        let lesson_id = self
            .lessons
            .insert_new_lesson(NewLessonRecord::from_lesson(&lesson))
            .await?;
        Ok(lesson_id)
    }

    /// Fetch a lesson by id.
    ///
    /// Returns `Ok(None)` when the lesson does not exist.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn get_lesson(
        &self,
        lesson_id: LessonId,
    ) -> Result<Option<Lesson>, LessonServiceError> {
        let lesson = self.lessons.get_lesson(lesson_id).await?;
        Ok(lesson)
    }

    /// Build the lesson page for one viewer.
    ///
    /// Orphan lessons short-circuit before any navigation is computed. For
    /// course lessons, a lesson missing from its own course's ordering is a
    /// data-consistency problem and surfaces as
    /// `ProgressError::OrderingMismatch` rather than a degenerate context.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::LessonNotFound` / `CourseNotFound` when
    /// references do not resolve, `Progress` for an ordering mismatch,
    /// `Storage` for repository failures.
    pub async fn lesson_view(
        &self,
        lesson_id: LessonId,
        viewer: Option<UserId>,
    ) -> Result<LessonView, LessonServiceError> {
        let lesson = self
            .lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(LessonServiceError::LessonNotFound(lesson_id))?;

        let completed = match viewer {
            Some(user) => {
                self.completions
                    .completion_set(user)
                    .await?
                    .contains(lesson_id)
            }
            None => false,
        };

        let Some(course_id) = lesson.course_id() else {
            // Orphan lesson: plain content, no course overlay.
            return Ok(LessonView {
                lesson,
                course: None,
                navigation: None,
                completed,
            });
        };

        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(LessonServiceError::CourseNotFound(course_id))?;
        let lessons = self.lessons.list_lessons_for_course(course_id).await?;
        let navigation = progress::navigation_context(lesson_id, &lessons)?;

        Ok(LessonView {
            lesson,
            course: Some(course),
            navigation: Some(navigation),
            completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lms_core::time::fixed_now;
    use storage::repository::{NewCourseRecord, Storage};

    fn service(storage: &Storage) -> LessonService {
        LessonService::new(
            Clock::Fixed(fixed_now()),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.completions),
        )
    }

    #[tokio::test]
    async fn create_lesson_round_trips() {
        let storage = Storage::in_memory();
        let service = service(&storage);

        let course_id = storage
            .courses
            .insert_new_course(NewCourseRecord {
                title: "Course".into(),
                description: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();

        let lesson_id = service
            .create_lesson(
                "Welcome".to_string(),
                Some(course_id),
                Some("https://example.com/welcome.mp4".to_string()),
                1,
            )
            .await
            .unwrap();

        let fetched = service.get_lesson(lesson_id).await.unwrap().unwrap();
        assert_eq!(fetched.title(), "Welcome");
        assert_eq!(fetched.course_id(), Some(course_id));
        assert_eq!(
            fetched.video_url().map(VideoUrl::as_str),
            Some("https://example.com/welcome.mp4")
        );
    }

    #[tokio::test]
    async fn create_lesson_rejects_bad_video_url() {
        let storage = Storage::in_memory();
        let service = service(&storage);

        let err = service
            .create_lesson("Clip".to_string(), None, Some("nope".to_string()), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LessonServiceError::Lesson(_)));
    }

    #[tokio::test]
    async fn lesson_view_of_missing_lesson_is_not_found() {
        let storage = Storage::in_memory();
        let service = service(&storage);

        let err = service
            .lesson_view(LessonId::new(404), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LessonServiceError::LessonNotFound(_)));
    }
}
