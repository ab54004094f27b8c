use lms_core::model::{Course, CourseId, Lesson, LessonId, UserId, VideoUrl};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    Course::new(
        course_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let course_id = row
        .try_get::<Option<i64>, _>("course_id")
        .map_err(ser)?
        .map(course_id_from_i64)
        .transpose()?;

    let video_url = row
        .try_get::<Option<String>, _>("video_url")
        .map_err(ser)?
        .map(VideoUrl::parse)
        .transpose()
        .map_err(ser)?;

    let sequence_i64: i64 = row.try_get("sequence").map_err(ser)?;
    let sequence = u32::try_from(sequence_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid sequence: {sequence_i64}")))?;

    Lesson::new(
        lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        course_id,
        video_url,
        sequence,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
