use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::dates::parse_date;
use crate::models::{Course, Enrollment, LessonLog, LogKind, Student, StudentStatus};
use crate::store::RecordStore;

pub const STUDENTS_FILE: &str = "students.csv";
pub const COURSES_FILE: &str = "courses.csv";
pub const ENROLLMENTS_FILE: &str = "student_courses.csv";
pub const LESSON_LOGS_FILE: &str = "lesson_logs.csv";

#[derive(Deserialize)]
struct StudentRow {
    student_id: Option<String>,
    grade: Option<String>,
    course_group: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct CourseRow {
    course_id: Option<String>,
    course_name: Option<String>,
    target_grade: Option<String>,
    standard_sessions: Option<String>,
    note: Option<String>,
}

#[derive(Deserialize)]
struct EnrollmentRow {
    student_id: Option<String>,
    course_id: Option<String>,
    planned_sessions: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Deserialize)]
struct LessonLogRow {
    log_id: Option<String>,
    date: Option<String>,
    student_id: Option<String>,
    course_id: Option<String>,
    count: Option<String>,
    registered_by: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// Empty, non-numeric and non-finite values read as zero.
pub fn parse_number(raw: Option<&str>) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

struct Table<T> {
    headers: Vec<String>,
    rows: Vec<T>,
}

async fn read_table(path: PathBuf) -> anyhow::Result<Option<Vec<u8>>> {
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "CSV file missing, treating as empty");
            Ok(None)
        }
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn parse_table<T: DeserializeOwned>(
    name: &str,
    bytes: Option<Vec<u8>>,
) -> anyhow::Result<Table<T>> {
    let Some(bytes) = bytes else {
        return Ok(Table {
            headers: Vec::new(),
            rows: Vec::new(),
        });
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes.as_slice());
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {name}"))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<T>().enumerate() {
        let row = result.with_context(|| format!("malformed row {} in {name}", index + 2))?;
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

pub fn students_from_csv(bytes: Option<Vec<u8>>) -> anyhow::Result<Vec<Student>> {
    let table: Table<StudentRow> = parse_table(STUDENTS_FILE, bytes)?;
    Ok(table
        .rows
        .into_iter()
        .map(|row| Student {
            student_id: text(row.student_id),
            grade: text(row.grade),
            course_group: text(row.course_group),
            status: StudentStatus::from(row.status.as_deref().unwrap_or_default()),
        })
        .collect())
}

pub fn courses_from_csv(bytes: Option<Vec<u8>>) -> anyhow::Result<Vec<Course>> {
    let table: Table<CourseRow> = parse_table(COURSES_FILE, bytes)?;
    Ok(table
        .rows
        .into_iter()
        .map(|row| Course {
            standard_sessions: parse_number(row.standard_sessions.as_deref()),
            course_id: text(row.course_id),
            course_name: text(row.course_name),
            target_grade: text(row.target_grade),
            note: text(row.note),
        })
        .collect())
}

pub fn enrollments_from_csv(bytes: Option<Vec<u8>>) -> anyhow::Result<Vec<Enrollment>> {
    let table: Table<EnrollmentRow> = parse_table(ENROLLMENTS_FILE, bytes)?;
    Ok(table
        .rows
        .into_iter()
        .map(|row| Enrollment {
            planned_sessions: parse_number(row.planned_sessions.as_deref()),
            start_date: row.start_date.as_deref().and_then(parse_date),
            end_date: row.end_date.as_deref().and_then(parse_date),
            student_id: text(row.student_id),
            course_id: text(row.course_id),
        })
        .collect())
}

/// Files without a `kind` column predate planned logs, so every row is actual.
pub fn lesson_logs_from_csv(bytes: Option<Vec<u8>>) -> anyhow::Result<Vec<LessonLog>> {
    let table: Table<LessonLogRow> = parse_table(LESSON_LOGS_FILE, bytes)?;
    let has_kind = table.headers.iter().any(|header| header == "kind");

    Ok(table
        .rows
        .into_iter()
        .map(|row| LessonLog {
            date: row.date.as_deref().and_then(parse_date),
            count: parse_number(row.count.as_deref()),
            created_at: parse_timestamp(row.created_at.as_deref()),
            kind: if has_kind {
                text(row.kind)
            } else {
                LogKind::Actual.as_str().to_string()
            },
            log_id: text(row.log_id),
            student_id: text(row.student_id),
            course_id: text(row.course_id),
            registered_by: text(row.registered_by),
        })
        .collect())
}

/// Reads all four CSV files concurrently and returns them as one snapshot.
/// Any parse failure aborts the whole load.
pub async fn load_snapshot(dir: &Path) -> anyhow::Result<RecordStore> {
    let (students, courses, enrollments, logs) = tokio::join!(
        read_table(dir.join(STUDENTS_FILE)),
        read_table(dir.join(COURSES_FILE)),
        read_table(dir.join(ENROLLMENTS_FILE)),
        read_table(dir.join(LESSON_LOGS_FILE)),
    );

    let store = RecordStore::new(
        students_from_csv(students?)?,
        courses_from_csv(courses?)?,
        enrollments_from_csv(enrollments?)?,
        lesson_logs_from_csv(logs?)?,
    );

    tracing::info!(
        dir = %dir.display(),
        students = store.students.len(),
        courses = store.courses.len(),
        enrollments = store.enrollments.len(),
        logs = store.logs.len(),
        "snapshot loaded"
    );

    Ok(store)
}
