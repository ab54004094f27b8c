use std::sync::Arc;

use lms_core::model::{CompletionSet, Course, CourseId, UserId};
use lms_core::progress::{self, ProgressSnapshot};
use storage::repository::{
    CompletionRepository, CourseRepository, LessonRepository, NewCourseRecord,
};

use crate::Clock;
use crate::error::CourseServiceError;

/// The course page's data: the course plus the viewer's progress over its
/// ordered lessons.
///
/// Presentation-agnostic: no pre-formatted strings, no rounding. The caller
/// rounds `progress.percentage` for display text and keeps the raw value for
/// bar widths, and only shows the progress section when `viewer` is present.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseOverview {
    pub course: Course,
    pub progress: ProgressSnapshot,
    pub viewer: Option<UserId>,
}

/// Orchestrates course persistence and the course-page view.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    completions: Arc<dyn CompletionRepository>,
}

impl CourseService {
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

    /// Create a new course and persist it.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for validation failures.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn create_course(
        &self,
        title: String,
        description: Option<String>,
    ) -> Result<CourseId, CourseServiceError> {
        let now = self.clock.now();
        let course = Course::new(CourseId::new(1), title, description, now)?;
        let course_id = self
            .courses
            .insert_new_course(NewCourseRecord::from_course(&course))
            .await?;
        Ok(course_id)
    }

    /// Fetch a course by id.
    ///
    /// Returns `Ok(None)` when the course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn get_course(
        &self,
        course_id: CourseId,
    ) -> Result<Option<Course>, CourseServiceError> {
        let course = self.courses.get_course(course_id).await?;
        Ok(course)
    }

    /// List courses by title, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list_courses(&self, limit: u32) -> Result<Vec<Course>, CourseServiceError> {
        let courses = self.courses.list_courses(limit).await?;
        Ok(courses)
    }

    /// Build the course page for one viewer.
    ///
    /// Anonymous viewers get an empty completion set: the lesson list and
    /// call-to-action still compute, from zero progress.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::CourseNotFound` if the course does not
    /// resolve, or `Storage` for repository failures.
    pub async fn course_overview(
        &self,
        course_id: CourseId,
        viewer: Option<UserId>,
    ) -> Result<CourseOverview, CourseServiceError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(CourseServiceError::CourseNotFound(course_id))?;

        let lessons = self.lessons.list_lessons_for_course(course_id).await?;
        let completed = match viewer {
            Some(user) => self.completions.completion_set(user).await?,
            None => CompletionSet::new(),
        };

        Ok(CourseOverview {
            progress: progress::course_progress(&lessons, &completed),
            course,
            viewer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lms_core::progress::CourseAction;
    use lms_core::time::fixed_now;
    use storage::repository::Storage;

    fn service(storage: &Storage) -> CourseService {
        CourseService::new(
            Clock::Fixed(fixed_now()),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.completions),
        )
    }

    #[tokio::test]
    async fn get_course_returns_persisted_course() {
        let storage = Storage::in_memory();
        let service = service(&storage);

        let course_id = service
            .create_course("Test".to_string(), Some("desc".to_string()))
            .await
            .unwrap();

        let fetched = service.get_course(course_id).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().title(), "Test");
    }

    #[tokio::test]
    async fn overview_of_empty_course_has_no_action() {
        let storage = Storage::in_memory();
        let service = service(&storage);

        let course_id = service
            .create_course("Empty".to_string(), None)
            .await
            .unwrap();

        let overview = service
            .course_overview(course_id, Some(UserId::new(1)))
            .await
            .unwrap();
        assert_eq!(overview.progress.total, 0);
        assert!((overview.progress.percentage - 0.0).abs() < f64::EPSILON);
        assert_eq!(overview.progress.action, None);
    }

    #[tokio::test]
    async fn overview_of_missing_course_is_not_found() {
        let storage = Storage::in_memory();
        let service = service(&storage);

        let err = service
            .course_overview(CourseId::new(404), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseServiceError::CourseNotFound(id) if id.value() == 404));
    }

    #[tokio::test]
    async fn overview_computes_viewer_progress() {
        let storage = Storage::in_memory();
        let service = service(&storage);

        let course_id = service
            .create_course("With lessons".to_string(), None)
            .await
            .unwrap();
        let l1 = storage
            .lessons
            .insert_new_lesson(storage::repository::NewLessonRecord {
                title: "L1".into(),
                course_id: Some(course_id),
                video_url: None,
                sequence: 1,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        storage
            .lessons
            .insert_new_lesson(storage::repository::NewLessonRecord {
                title: "L2".into(),
                course_id: Some(course_id),
                video_url: None,
                sequence: 2,
                created_at: fixed_now(),
            })
            .await
            .unwrap();

        let user = UserId::new(5);
        storage
            .completions
            .add_completion(user, l1, fixed_now())
            .await
            .unwrap();

        let overview = service.course_overview(course_id, Some(user)).await.unwrap();
        assert_eq!(overview.progress.completed, 1);
        assert!((overview.progress.percentage - 50.0).abs() < f64::EPSILON);
        assert!(matches!(
            overview.progress.action,
            Some(CourseAction::Continue(_))
        ));
    }
}
