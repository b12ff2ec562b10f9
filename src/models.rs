use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum StudentStatus {
    Active,
    Inactive,
    Other(String),
}

impl StudentStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, StudentStatus::Active)
    }
}

impl From<&str> for StudentStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "active" => StudentStatus::Active,
            "inactive" => StudentStatus::Inactive,
            _ => StudentStatus::Other(value.to_string()),
        }
    }
}

impl From<StudentStatus> for String {
    fn from(status: StudentStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentStatus::Active => f.write_str("active"),
            StudentStatus::Inactive => f.write_str("inactive"),
            StudentStatus::Other(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub student_id: String,
    pub grade: String,
    pub course_group: String,
    pub status: StudentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub course_id: String,
    pub course_name: String,
    pub target_grade: String,
    pub standard_sessions: f64,
    pub note: String,
}

/// Binding of one student to one course, with an optional validity span.
#[derive(Debug, Clone, Serialize)]
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
    pub planned_sessions: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonLog {
    pub log_id: String,
    /// `None` when the source value was missing or unparseable.
    pub date: Option<NaiveDate>,
    pub student_id: String,
    pub course_id: String,
    pub count: f64,
    pub registered_by: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Raw kind marker. Loaders fill in `"actual"` when the source has no kind column.
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Actual,
    Planned,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Actual => "actual",
            LogKind::Planned => "planned",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimelineUnit {
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAchievement<'a> {
    pub student: &'a Student,
    pub planned: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseAchievement<'a> {
    pub course: &'a Course,
    pub student_count: usize,
    pub planned: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentProgress<'a> {
    pub enrollment: &'a Enrollment,
    pub course: Option<&'a Course>,
    pub actual: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DayTotals {
    pub planned: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineBucket {
    pub key: String,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub active_students: usize,
    pub month_actual: f64,
    pub average_rate: Option<f64>,
}
