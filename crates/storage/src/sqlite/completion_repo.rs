use chrono::{DateTime, Utc};
use lms_core::model::{CompletionSet, LessonId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, lesson_id_from_i64, ser, user_id_from_i64};
use crate::repository::{CompletionRepository, StorageError};

#[async_trait::async_trait]
impl CompletionRepository for SqliteRepository {
    async fn completion_set(&self, user_id: UserId) -> Result<CompletionSet, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT lesson_id
            FROM lesson_completions
            WHERE user_id = ?1
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut set = CompletionSet::new();
        for row in rows {
            set.insert(lesson_id_from_i64(
                row.try_get::<i64, _>("lesson_id").map_err(ser)?,
            )?);
        }
        Ok(set)
    }

    async fn add_completion(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        // Single-statement set-member insert: the primary key makes the
        // double-click and retry cases no-ops instead of lost updates.
        let res = sqlx::query(
            r"
            INSERT OR IGNORE INTO lesson_completions (user_id, lesson_id, completed_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("lesson_id", lesson_id.value())?)
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.rows_affected() > 0)
    }

    async fn save_completion_set(
        &self,
        user_id: UserId,
        set: &CompletionSet,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let user = id_to_i64("user_id", user_id.value())?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for lesson_id in set.iter() {
            sqlx::query(
                r"
                INSERT OR IGNORE INTO lesson_completions (user_id, lesson_id, completed_at)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(user)
            .bind(id_to_i64("lesson_id", lesson_id.value())?)
            .bind(completed_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn users_with_completions(&self) -> Result<Vec<UserId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT user_id
            FROM lesson_completions
            ORDER BY user_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(user_id_from_i64(
                row.try_get::<i64, _>("user_id").map_err(ser)?,
            )?);
        }
        Ok(users)
    }
}
