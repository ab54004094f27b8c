use lms_core::model::{Course, CourseId};

use super::SqliteRepository;
use super::mapping::{course_id_from_i64, id_to_i64, map_course_row};
use crate::repository::{CourseRepository, NewCourseRecord, StorageError};

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn insert_new_course(&self, course: NewCourseRecord) -> Result<CourseId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO courses (title, description, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(course.title)
        .bind(course.description)
        .bind(course.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        course_id_from_i64(res.last_insert_rowid())
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO courses (id, title, description, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description
            ",
        )
        .bind(id_to_i64("course_id", course.id().value())?)
        .bind(course.title().to_owned())
        .bind(course.description().map(ToOwned::to_owned))
        .bind(course.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, created_at
            FROM courses WHERE id = ?1
            ",
        )
        .bind(id_to_i64("course_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_course_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_courses(&self, limit: u32) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, created_at
            FROM courses
            ORDER BY title ASC, id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            courses.push(map_course_row(&row)?);
        }
        Ok(courses)
    }
}
