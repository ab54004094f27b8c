use std::sync::Arc;

use lms_core::model::{Lesson, UserId};
use lms_core::time::fixed_now;
use services::{Clock, CourseService, LessonService, ProgressService};
use storage::repository::Storage;

fn build_services(storage: &Storage) -> (CourseService, LessonService, ProgressService) {
    let clock = Clock::fixed(fixed_now());
    let courses = CourseService::new(
        clock,
        Arc::clone(&storage.courses),
        Arc::clone(&storage.lessons),
        Arc::clone(&storage.completions),
    );
    let lessons = LessonService::new(
        clock,
        Arc::clone(&storage.courses),
        Arc::clone(&storage.lessons),
        Arc::clone(&storage.completions),
    );
    let progress = ProgressService::new(
        clock,
        Arc::clone(&storage.courses),
        Arc::clone(&storage.lessons),
        Arc::clone(&storage.completions),
    );
    (courses, lessons, progress)
}

#[tokio::test]
async fn lesson_view_walks_prev_and_next() {
    let storage = Storage::sqlite("sqlite:file:memdb_lesson_nav?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let (course_service, lesson_service, _) = build_services(&storage);

    let course_id = course_service
        .create_course("Navigation".to_string(), None)
        .await
        .expect("create course");
    let a = lesson_service
        .create_lesson("A".to_string(), Some(course_id), None, 1)
        .await
        .expect("create A");
    let b = lesson_service
        .create_lesson(
            "B".to_string(),
            Some(course_id),
            Some("https://example.com/b.mp4".to_string()),
            2,
        )
        .await
        .expect("create B");
    let c = lesson_service
        .create_lesson("C".to_string(), Some(course_id), None, 3)
        .await
        .expect("create C");

    let view = lesson_service.lesson_view(b, None).await.expect("view B");
    let nav = view.navigation.expect("navigation");
    assert_eq!(nav.position, 2);
    assert_eq!(nav.total, 3);
    assert_eq!(nav.previous.as_ref().map(Lesson::id), Some(a));
    assert_eq!(nav.next.as_ref().map(Lesson::id), Some(c));
    assert_eq!(
        view.lesson.video_url().map(|v| v.as_str()),
        Some("https://example.com/b.mp4")
    );
    assert_eq!(view.course.as_ref().map(|course| course.id()), Some(course_id));

    let view = lesson_service.lesson_view(a, None).await.expect("view A");
    let nav = view.navigation.expect("navigation");
    assert_eq!(nav.position, 1);
    assert_eq!(nav.previous, None);

    // Last lesson: no next, the caller falls back to a course link.
    let view = lesson_service.lesson_view(c, None).await.expect("view C");
    let nav = view.navigation.expect("navigation");
    assert_eq!(nav.position, 3);
    assert_eq!(nav.next, None);
    assert_eq!(nav.previous.as_ref().map(Lesson::id), Some(b));
}

#[tokio::test]
async fn orphan_lesson_renders_without_course_overlay() {
    let storage = Storage::sqlite("sqlite:file:memdb_orphan?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let (_, lesson_service, _) = build_services(&storage);

    let orphan = lesson_service
        .create_lesson("Standalone".to_string(), None, None, 0)
        .await
        .expect("create orphan");

    let view = lesson_service
        .lesson_view(orphan, Some(UserId::new(1)))
        .await
        .expect("view orphan");
    assert_eq!(view.course, None);
    assert_eq!(view.navigation, None);
    assert!(!view.completed);
}

#[tokio::test]
async fn lesson_view_reports_viewer_completion() {
    let storage = Storage::sqlite("sqlite:file:memdb_view_completed?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let (course_service, lesson_service, progress_service) = build_services(&storage);

    let course_id = course_service
        .create_course("Completion flag".to_string(), None)
        .await
        .expect("create course");
    let l1 = lesson_service
        .create_lesson("L1".to_string(), Some(course_id), None, 1)
        .await
        .expect("create L1");

    let user = UserId::new(2);
    progress_service.mark_complete(user, l1).await.expect("mark");

    let view = lesson_service
        .lesson_view(l1, Some(user))
        .await
        .expect("view");
    assert!(view.completed);

    let view = lesson_service.lesson_view(l1, None).await.expect("view anon");
    assert!(!view.completed);
}

#[tokio::test]
async fn create_lesson_rejects_unknown_course() {
    let storage = Storage::sqlite("sqlite:file:memdb_bad_parent?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let (_, lesson_service, _) = build_services(&storage);

    let err = lesson_service
        .create_lesson(
            "Dangling".to_string(),
            Some(lms_core::model::CourseId::new(404)),
            None,
            1,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        services::LessonServiceError::CourseNotFound(id) if id.value() == 404
    ));
}
