use lms_core::model::{CourseId, Lesson, LessonId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, lesson_id_from_i64, map_lesson_row};
use crate::repository::{LessonRepository, NewLessonRecord, StorageError};

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn insert_new_lesson(&self, lesson: NewLessonRecord) -> Result<LessonId, StorageError> {
        let course_id = lesson
            .course_id
            .map(|id| id_to_i64("course_id", id.value()))
            .transpose()?;

        let res = sqlx::query(
            r"
            INSERT INTO lessons (title, course_id, video_url, sequence, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(lesson.title)
        .bind(course_id)
        .bind(lesson.video_url)
        .bind(i64::from(lesson.sequence))
        .bind(lesson.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        lesson_id_from_i64(res.last_insert_rowid())
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let course_id = lesson
            .course_id()
            .map(|id| id_to_i64("course_id", id.value()))
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO lessons (id, title, course_id, video_url, sequence, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                course_id = excluded.course_id,
                video_url = excluded.video_url,
                sequence = excluded.sequence
            ",
        )
        .bind(id_to_i64("lesson_id", lesson.id().value())?)
        .bind(lesson.title().to_owned())
        .bind(course_id)
        .bind(lesson.video_url().map(|v| v.as_str().to_owned()))
        .bind(i64::from(lesson.sequence()))
        .bind(lesson.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, course_id, video_url, sequence, created_at
            FROM lessons WHERE id = ?1
            ",
        )
        .bind(id_to_i64("lesson_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_lesson_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_lessons_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, course_id, video_url, sequence, created_at
            FROM lessons
            WHERE course_id = ?1
            ORDER BY sequence ASC, title ASC, id ASC
            ",
        )
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut lessons = Vec::with_capacity(rows.len());
        for row in rows {
            lessons.push(map_lesson_row(&row)?);
        }
        Ok(lessons)
    }
}
