use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema: courses, lessons with their parent-course
/// foreign key, per-user lesson completions, and the ordering index.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS courses (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    description TEXT,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // A lesson may outlive its course; deletion turns it into an orphan
        // rather than deleting user-visible content.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS lessons (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    course_id INTEGER,
                    video_url TEXT,
                    sequence INTEGER NOT NULL CHECK (sequence >= 0),
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE SET NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // The (user_id, lesson_id) primary key is what makes completion
        // marking an atomic, idempotent set-member insert.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS lesson_completions (
                    user_id INTEGER NOT NULL,
                    lesson_id INTEGER NOT NULL,
                    completed_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, lesson_id),
                    FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_lessons_course_order
                    ON lessons(course_id, sequence, title);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_completions_lesson
                    ON lesson_completions(lesson_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
            .bind(1_i64)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}
