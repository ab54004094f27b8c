use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lms_core::model::{CompletionSet, Course, CourseId, Lesson, LessonId, UserId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a course whose id is allocated by the store.
#[derive(Debug, Clone)]
pub struct NewCourseRecord {
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewCourseRecord {
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            title: course.title().to_owned(),
            description: course.description().map(str::to_owned),
            created_at: course.created_at(),
        }
    }
}

/// Insert shape for a lesson whose id is allocated by the store.
///
/// The video URL travels as its string form; parsing back through
/// `VideoUrl` happens when rows are mapped to domain lessons.
#[derive(Debug, Clone)]
pub struct NewLessonRecord {
    pub title: String,
    pub course_id: Option<CourseId>,
    pub video_url: Option<String>,
    pub sequence: u32,
    pub created_at: DateTime<Utc>,
}

impl NewLessonRecord {
    #[must_use]
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            title: lesson.title().to_owned(),
            course_id: lesson.course_id(),
            video_url: lesson.video_url().map(|v| v.as_str().to_owned()),
            sequence: lesson.sequence(),
            created_at: lesson.created_at(),
        }
    }
}

/// Repository contract for courses.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Insert a new course, letting the store allocate the id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn insert_new_course(&self, course: NewCourseRecord) -> Result<CourseId, StorageError>;

    /// Persist or update a course under its existing id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by id. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// List courses by title ascending, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_courses(&self, limit: u32) -> Result<Vec<Course>, StorageError>;
}

/// Repository contract for lessons.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Insert a new lesson, letting the store allocate the id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn insert_new_lesson(&self, lesson: NewLessonRecord) -> Result<LessonId, StorageError>;

    /// Persist or update a lesson under its existing id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Fetch a lesson by id. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// The course's lessons in course order: sequence ascending, title as
    /// tie-break.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_lessons_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, StorageError>;
}

/// Repository contract for per-user completion records.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// The user's completion set. Empty for unknown or anonymous users.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn completion_set(&self, user_id: UserId) -> Result<CompletionSet, StorageError>;

    /// Atomically add one lesson to the user's set.
    ///
    /// This is the write path for completion marking: a single set-member
    /// insert rather than read-modify-write, so concurrent marks for the
    /// same (user, lesson) pair cannot lose updates. Returns true if the
    /// member was newly added.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn add_completion(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Replace the user's stored set with the given one.
    ///
    /// Members only ever accumulate here: existing entries missing from
    /// `set` are kept, matching the engine's append-only contract.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn save_completion_set(
        &self,
        user_id: UserId,
        set: &CompletionSet,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Users holding at least one completion, for reporting.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn users_with_completions(&self) -> Result<Vec<UserId>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    lessons: Arc<Mutex<HashMap<LessonId, Lesson>>>,
    completions: Arc<Mutex<BTreeMap<UserId, BTreeSet<LessonId>>>>,
    next_course_id: Arc<Mutex<u64>>,
    next_lesson_id: Arc<Mutex<u64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            courses: Arc::new(Mutex::new(HashMap::new())),
            lessons: Arc::new(Mutex::new(HashMap::new())),
            completions: Arc::new(Mutex::new(BTreeMap::new())),
            next_course_id: Arc::new(Mutex::new(1)),
            next_lesson_id: Arc::new(Mutex::new(1)),
        }
    }

    fn allocate(counter: &Mutex<u64>) -> Result<u64, StorageError> {
        let mut guard = counter
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = *guard;
        *guard += 1;
        Ok(id)
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn insert_new_course(&self, course: NewCourseRecord) -> Result<CourseId, StorageError> {
        let id = CourseId::new(Self::allocate(&self.next_course_id)?);
        let course = Course::new(id, course.title, course.description, course.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, course);
        Ok(id)
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_courses(&self, limit: u32) -> Result<Vec<Course>, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut courses: Vec<Course> = guard.values().cloned().collect();
        courses.sort_by(|a, b| a.title().cmp(b.title()).then(a.id().cmp(&b.id())));
        courses.truncate(limit as usize);
        Ok(courses)
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn insert_new_lesson(&self, lesson: NewLessonRecord) -> Result<LessonId, StorageError> {
        let id = LessonId::new(Self::allocate(&self.next_lesson_id)?);
        let video_url = lesson
            .video_url
            .map(lms_core::model::VideoUrl::parse)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let lesson = Lesson::new(
            id,
            lesson.title,
            lesson.course_id,
            video_url,
            lesson.sequence,
            lesson.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, lesson);
        Ok(id)
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(lesson.id(), lesson.clone());
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_lessons_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut lessons: Vec<Lesson> = guard
            .values()
            .filter(|l| l.course_id() == Some(course_id))
            .cloned()
            .collect();
        lessons.sort_by(Lesson::course_order);
        Ok(lessons)
    }
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn completion_set(&self, user_id: UserId) -> Result<CompletionSet, StorageError> {
        let guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn add_completion(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        _completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.entry(user_id).or_default().insert(lesson_id))
    }

    async fn save_completion_set(
        &self,
        user_id: UserId,
        set: &CompletionSet,
        _completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.entry(user_id).or_default().extend(set.iter());
        Ok(())
    }

    async fn users_with_completions(&self) -> Result<Vec<UserId>, StorageError> {
        let guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(user, _)| *user)
            .collect())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub completions: Arc<dyn CompletionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
        let completions: Arc<dyn CompletionRepository> = Arc::new(repo);
        Self {
            courses,
            lessons,
            completions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::time::fixed_now;

    fn new_course(title: &str) -> NewCourseRecord {
        NewCourseRecord {
            title: title.to_owned(),
            description: None,
            created_at: fixed_now(),
        }
    }

    fn new_lesson(title: &str, course_id: CourseId, sequence: u32) -> NewLessonRecord {
        NewLessonRecord {
            title: title.to_owned(),
            course_id: Some(course_id),
            video_url: None,
            sequence,
            created_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn lists_lessons_in_course_order() {
        let repo = InMemoryRepository::new();
        let course_id = repo.insert_new_course(new_course("Intro")).await.unwrap();

        repo.insert_new_lesson(new_lesson("Later", course_id, 2))
            .await
            .unwrap();
        repo.insert_new_lesson(new_lesson("First", course_id, 1))
            .await
            .unwrap();
        repo.insert_new_lesson(new_lesson("Also second", course_id, 2))
            .await
            .unwrap();

        let lessons = repo.list_lessons_for_course(course_id).await.unwrap();
        let titles: Vec<&str> = lessons.iter().map(Lesson::title).collect();
        assert_eq!(titles, ["First", "Also second", "Later"]);
    }

    #[tokio::test]
    async fn lessons_for_other_courses_excluded() {
        let repo = InMemoryRepository::new();
        let a = repo.insert_new_course(new_course("A")).await.unwrap();
        let b = repo.insert_new_course(new_course("B")).await.unwrap();
        repo.insert_new_lesson(new_lesson("In A", a, 1)).await.unwrap();
        repo.insert_new_lesson(new_lesson("In B", b, 1)).await.unwrap();

        let lessons = repo.list_lessons_for_course(a).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].title(), "In A");
    }

    #[tokio::test]
    async fn add_completion_deduplicates() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let lesson = LessonId::new(5);

        assert!(repo.add_completion(user, lesson, fixed_now()).await.unwrap());
        assert!(!repo.add_completion(user, lesson, fixed_now()).await.unwrap());

        let set = repo.completion_set(user).await.unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(lesson));
    }

    #[tokio::test]
    async fn completion_set_empty_for_unknown_user() {
        let repo = InMemoryRepository::new();
        let set = repo.completion_set(UserId::new(404)).await.unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn save_completion_set_never_shrinks() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(2);
        repo.add_completion(user, LessonId::new(1), fixed_now())
            .await
            .unwrap();

        let smaller = CompletionSet::from_lessons([LessonId::new(2)]);
        repo.save_completion_set(user, &smaller, fixed_now())
            .await
            .unwrap();

        let set = repo.completion_set(user).await.unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(LessonId::new(1)));
        assert!(set.contains(LessonId::new(2)));
    }

    #[tokio::test]
    async fn reports_users_with_completions() {
        let repo = InMemoryRepository::new();
        repo.add_completion(UserId::new(3), LessonId::new(1), fixed_now())
            .await
            .unwrap();

        let users = repo.users_with_completions().await.unwrap();
        assert_eq!(users, vec![UserId::new(3)]);
    }
}
