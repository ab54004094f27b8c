use std::fmt;

use chrono::{DateTime, Utc};
use lms_core::model::{Course, CourseId, VideoUrl};
use storage::repository::{NewCourseRecord, NewLessonRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    course_id: CourseId,
    course_title: String,
    course_desc: Option<String>,
    lessons: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCourseId { raw: String },
    InvalidLessons { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCourseId { raw } => write!(f, "invalid --course-id value: {raw}"),
            ArgsError::InvalidLessons { raw } => write!(f, "invalid --lessons value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LMS_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut course_id = std::env::var("LMS_COURSE_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| CourseId::new(1), CourseId::new);
        let mut course_title =
            std::env::var("LMS_COURSE_TITLE").unwrap_or_else(|_| "Getting Started".into());
        let mut course_desc = std::env::var("LMS_COURSE_DESC").ok();
        let mut lessons = std::env::var("LMS_LESSONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(5);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--course-id" => {
                    let value = require_value(&mut args, "--course-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCourseId { raw: value.clone() })?;
                    course_id = CourseId::new(parsed);
                }
                "--course-title" => {
                    let value = require_value(&mut args, "--course-title")?;
                    course_title = value;
                }
                "--course-desc" => {
                    let value = require_value(&mut args, "--course-desc")?;
                    course_desc = Some(value);
                }
                "--lessons" => {
                    let value = require_value(&mut args, "--lessons")?;
                    lessons = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidLessons { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            course_id,
            course_title,
            course_desc,
            lessons,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --course-id <id>          Course id to upsert (default: 1)");
    eprintln!("  --course-title <title>    Course title (default: Getting Started)");
    eprintln!("  --course-desc <text>      Optional course description");
    eprintln!("  --lessons <n>             Number of sample lessons to upsert (default: 5)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LMS_DB_URL, LMS_COURSE_ID, LMS_COURSE_TITLE, LMS_COURSE_DESC, LMS_LESSONS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let course_id = match storage.courses.get_course(args.course_id).await? {
        Some(course) => {
            let updated = Course::new(
                course.id(),
                args.course_title.clone(),
                args.course_desc.clone(),
                now,
            )?;
            storage.courses.upsert_course(&updated).await?;
            course.id()
        }
        None => {
            let draft = Course::new(
                args.course_id,
                args.course_title.clone(),
                args.course_desc.clone(),
                now,
            )?;
            storage
                .courses
                .insert_new_course(NewCourseRecord::from_course(&draft))
                .await?
        }
    };

    let samples = [
        ("Welcome", Some("https://example.com/videos/welcome.mp4")),
        ("Setting up your workspace", None),
        ("First steps", Some("https://example.com/videos/first-steps.mp4")),
        ("Going deeper", None),
        ("Wrapping up", None),
    ];
    for i in 0..args.lessons {
        let idx = (i as usize) % samples.len();
        let (title, video) = samples[idx];
        let video_url = video.map(VideoUrl::parse).transpose()?;
        let title = if i as usize >= samples.len() {
            format!("{title} (part {})", i as usize / samples.len() + 1)
        } else {
            title.to_owned()
        };
        storage
            .lessons
            .insert_new_lesson(NewLessonRecord {
                title,
                course_id: Some(course_id),
                video_url: video_url.map(|v| v.as_str().to_owned()),
                sequence: i + 1,
                created_at: now,
            })
            .await?;
    }

    println!(
        "seeded course {} ({}) with {} lessons into {}",
        course_id, args.course_title, args.lessons, args.db_url
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
