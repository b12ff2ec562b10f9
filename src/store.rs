use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::achievement::{compute_course_achievement, compute_student_achievement};
use crate::apportion::Window;
use crate::daily::daily_totals;
use crate::models::{
    Course, CourseAchievement, DayTotals, Enrollment, LessonLog, LogKind, Student,
    StudentAchievement, TimelineBucket, TimelineUnit,
};
use crate::timeline::bucketize;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("unknown student {0}")]
    UnknownStudent(String),
    #[error("unknown course {0}")]
    UnknownCourse(String),
    #[error("student {student_id} is already enrolled in {course_id}")]
    DuplicateEnrollment { student_id: String, course_id: String },
    #[error("course {0} already exists")]
    DuplicateCourse(String),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("session count must be a number greater than zero, got {0}")]
    InvalidCount(f64),
    #[error("no lesson log with id {0}")]
    UnknownLog(String),
    #[error("student {student_id} is not enrolled in {course_id}")]
    UnknownEnrollment { student_id: String, course_id: String },
}

/// A lesson log as submitted, before an id and timestamp are assigned.
#[derive(Debug, Clone)]
pub struct NewLog {
    pub date: NaiveDate,
    pub student_id: String,
    pub course_id: String,
    pub count: f64,
    pub registered_by: String,
    pub kind: LogKind,
}

/// One consistent snapshot of the four record collections.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub students: Vec<Student>,
    pub courses: Vec<Course>,
    pub enrollments: Vec<Enrollment>,
    pub logs: Vec<LessonLog>,
}

impl RecordStore {
    pub fn new(
        students: Vec<Student>,
        courses: Vec<Course>,
        enrollments: Vec<Enrollment>,
        logs: Vec<LessonLog>,
    ) -> Self {
        RecordStore {
            students,
            courses,
            enrollments,
            logs,
        }
    }

    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.student_id == student_id)
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.course_id == course_id)
    }

    pub fn student_achievement(&self, window: Window) -> Vec<StudentAchievement<'_>> {
        compute_student_achievement(
            &self.students,
            &self.enrollments,
            &self.logs,
            window.start,
            window.end,
        )
    }

    pub fn course_achievement(&self, window: Window) -> Vec<CourseAchievement<'_>> {
        compute_course_achievement(
            &self.courses,
            &self.enrollments,
            &self.logs,
            window.start,
            window.end,
        )
    }

    pub fn timeline(&self, window: Window, unit: TimelineUnit) -> Vec<TimelineBucket> {
        bucketize(&self.logs, window.start, window.end, unit)
    }

    pub fn daily_totals(
        &self,
        student_id: &str,
        year: i32,
        month0: u32,
    ) -> BTreeMap<NaiveDate, DayTotals> {
        daily_totals(&self.logs, student_id, year, month0)
    }

    /// `YYYYMMDD-<student>-<seq>`, one past the highest sequence already used
    /// by that student on that day.
    pub fn next_log_id(&self, date: NaiveDate, student_id: &str) -> String {
        let max_seq = self
            .logs
            .iter()
            .filter(|log| log.date == Some(date) && log.student_id == student_id)
            .filter_map(|log| log.log_id.rsplit('-').next())
            .filter_map(|seq| seq.trim().parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        format!("{}-{}-{}", date.format("%Y%m%d"), student_id, max_seq + 1)
    }

    pub fn add_log(
        &mut self,
        new_log: NewLog,
        now: DateTime<Utc>,
    ) -> Result<&LessonLog, StoreError> {
        if self.student(&new_log.student_id).is_none() {
            return Err(StoreError::UnknownStudent(new_log.student_id));
        }
        if new_log.course_id.trim().is_empty() {
            return Err(StoreError::MissingField("course_id"));
        }
        if self.course(&new_log.course_id).is_none() {
            return Err(StoreError::UnknownCourse(new_log.course_id));
        }
        if !new_log.count.is_finite() || new_log.count <= 0.0 {
            return Err(StoreError::InvalidCount(new_log.count));
        }

        let log_id = self.next_log_id(new_log.date, &new_log.student_id);
        tracing::info!(
            log_id = %log_id,
            student_id = %new_log.student_id,
            course_id = %new_log.course_id,
            count = new_log.count,
            kind = %new_log.kind,
            "lesson log added"
        );

        self.logs.push(LessonLog {
            log_id,
            date: Some(new_log.date),
            student_id: new_log.student_id,
            course_id: new_log.course_id,
            count: new_log.count,
            registered_by: new_log.registered_by,
            created_at: Some(now),
            kind: new_log.kind.as_str().to_string(),
        });

        let index = self.logs.len() - 1;
        Ok(&self.logs[index])
    }

    pub fn delete_log(&mut self, log_id: &str) -> Result<LessonLog, StoreError> {
        let index = self
            .logs
            .iter()
            .position(|log| log.log_id == log_id)
            .ok_or_else(|| StoreError::UnknownLog(log_id.to_string()))?;

        tracing::info!(log_id, "lesson log deleted");
        Ok(self.logs.remove(index))
    }

    pub fn add_enrollment(&mut self, enrollment: Enrollment) -> Result<(), StoreError> {
        if enrollment.course_id.trim().is_empty() {
            return Err(StoreError::MissingField("course_id"));
        }
        if self.student(&enrollment.student_id).is_none() {
            return Err(StoreError::UnknownStudent(enrollment.student_id));
        }
        if self.course(&enrollment.course_id).is_none() {
            return Err(StoreError::UnknownCourse(enrollment.course_id));
        }
        let exists = self.enrollments.iter().any(|existing| {
            existing.student_id == enrollment.student_id
                && existing.course_id == enrollment.course_id
        });
        if exists {
            return Err(StoreError::DuplicateEnrollment {
                student_id: enrollment.student_id,
                course_id: enrollment.course_id,
            });
        }

        tracing::info!(
            student_id = %enrollment.student_id,
            course_id = %enrollment.course_id,
            planned_sessions = enrollment.planned_sessions,
            "enrollment added"
        );
        self.enrollments.push(enrollment);
        Ok(())
    }

    /// Updates every matching enrollment in place; negative or non-finite values become 0.
    pub fn set_planned_sessions(
        &mut self,
        student_id: &str,
        course_id: &str,
        planned_sessions: f64,
    ) -> Result<(), StoreError> {
        let value = if planned_sessions.is_finite() && planned_sessions > 0.0 {
            planned_sessions
        } else {
            0.0
        };

        let mut updated = 0usize;
        for enrollment in self
            .enrollments
            .iter_mut()
            .filter(|e| e.student_id == student_id && e.course_id == course_id)
        {
            enrollment.planned_sessions = value;
            updated += 1;
        }

        if updated == 0 {
            return Err(StoreError::UnknownEnrollment {
                student_id: student_id.to_string(),
                course_id: course_id.to_string(),
            });
        }

        tracing::info!(student_id, course_id, planned_sessions = value, "planned sessions updated");
        Ok(())
    }

    pub fn add_course(&mut self, course: Course) -> Result<(), StoreError> {
        if course.course_id.trim().is_empty() {
            return Err(StoreError::MissingField("course_id"));
        }
        if course.course_name.trim().is_empty() {
            return Err(StoreError::MissingField("course_name"));
        }
        if self.course(&course.course_id).is_some() {
            return Err(StoreError::DuplicateCourse(course.course_id));
        }

        tracing::info!(course_id = %course.course_id, "course added");
        self.courses.push(course);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_store() -> RecordStore {
        RecordStore::new(
            vec![Student {
                student_id: "S001".to_string(),
                grade: "11".to_string(),
                course_group: "humanities".to_string(),
                status: StudentStatus::Active,
            }],
            vec![Course {
                course_id: "C001".to_string(),
                course_name: "English Reading".to_string(),
                target_grade: "11".to_string(),
                standard_sessions: 20.0,
                note: String::new(),
            }],
            vec![Enrollment {
                student_id: "S001".to_string(),
                course_id: "C001".to_string(),
                planned_sessions: 10.0,
                start_date: None,
                end_date: None,
            }],
            Vec::new(),
        )
    }

    fn new_log(day: NaiveDate, count: f64) -> NewLog {
        NewLog {
            date: day,
            student_id: "S001".to_string(),
            course_id: "C001".to_string(),
            count,
            registered_by: "teacher1".to_string(),
            kind: LogKind::Actual,
        }
    }

    #[test]
    fn log_ids_increment_per_student_day() {
        let mut store = sample_store();
        let now = Utc::now();
        let first = store.add_log(new_log(date(2024, 4, 5), 1.0), now).unwrap().log_id.clone();
        let second = store.add_log(new_log(date(2024, 4, 5), 2.0), now).unwrap().log_id.clone();
        let other_day = store.add_log(new_log(date(2024, 4, 6), 1.0), now).unwrap().log_id.clone();

        assert_eq!(first, "20240405-S001-1");
        assert_eq!(second, "20240405-S001-2");
        assert_eq!(other_day, "20240406-S001-1");
    }

    #[test]
    fn add_log_rejects_bad_input() {
        let mut store = sample_store();
        let now = Utc::now();
        assert_eq!(
            store.add_log(new_log(date(2024, 4, 5), 0.0), now).unwrap_err(),
            StoreError::InvalidCount(0.0)
        );

        let mut stranger = new_log(date(2024, 4, 5), 1.0);
        stranger.student_id = "S999".to_string();
        assert_eq!(
            store.add_log(stranger, now).unwrap_err(),
            StoreError::UnknownStudent("S999".to_string())
        );

        let mut unlisted = new_log(date(2024, 4, 5), 1.0);
        unlisted.course_id = "C404".to_string();
        assert_eq!(
            store.add_log(unlisted, now).unwrap_err(),
            StoreError::UnknownCourse("C404".to_string())
        );
        assert!(store.logs.is_empty());
    }

    #[test]
    fn enrollment_requires_listed_course() {
        let mut store = sample_store();
        let mut unlisted = store.enrollments[0].clone();
        unlisted.course_id = "C404".to_string();
        assert_eq!(
            store.add_enrollment(unlisted).unwrap_err(),
            StoreError::UnknownCourse("C404".to_string())
        );
        assert_eq!(store.enrollments.len(), 1);
    }

    #[test]
    fn writes_are_visible_to_next_computation() {
        let mut store = sample_store();
        let april = Window::between(date(2024, 4, 1), date(2024, 4, 30));
        assert_eq!(store.student_achievement(april)[0].actual, 0.0);

        let id = store
            .add_log(new_log(date(2024, 4, 5), 3.0), Utc::now())
            .unwrap()
            .log_id
            .clone();
        assert_eq!(store.student_achievement(april)[0].actual, 3.0);

        store.set_planned_sessions("S001", "C001", 6.0).unwrap();
        assert_eq!(store.student_achievement(april)[0].rate(), Some(0.5));

        store.delete_log(&id).unwrap();
        assert_eq!(store.student_achievement(april)[0].actual, 0.0);
        assert_eq!(store.delete_log(&id).unwrap_err(), StoreError::UnknownLog(id));
    }

    #[test]
    fn enrollment_pairs_are_unique_on_add() {
        let mut store = sample_store();
        let duplicate = store.enrollments[0].clone();
        assert!(matches!(
            store.add_enrollment(duplicate),
            Err(StoreError::DuplicateEnrollment { .. })
        ));

        let mut second_course = store.courses[0].clone();
        second_course.course_id = "C002".to_string();
        store.add_course(second_course).unwrap();

        let mut fresh = store.enrollments[0].clone();
        fresh.course_id = "C002".to_string();
        store.add_enrollment(fresh).unwrap();
        assert_eq!(store.enrollments.len(), 2);
    }

    #[test]
    fn planned_sessions_clamp_to_zero() {
        let mut store = sample_store();
        store.set_planned_sessions("S001", "C001", -4.0).unwrap();
        assert_eq!(store.enrollments[0].planned_sessions, 0.0);
        assert!(store.set_planned_sessions("S001", "C404", 3.0).is_err());
    }

    #[test]
    fn courses_need_unique_id_and_name() {
        let mut store = sample_store();
        let mut course = store.courses[0].clone();
        assert_eq!(
            store.add_course(course.clone()).unwrap_err(),
            StoreError::DuplicateCourse("C001".to_string())
        );
        course.course_id = "C002".to_string();
        course.course_name = " ".to_string();
        assert_eq!(
            store.add_course(course.clone()).unwrap_err(),
            StoreError::MissingField("course_name")
        );
        course.course_name = "Mathematics".to_string();
        store.add_course(course).unwrap();
        assert!(store.course("C002").is_some());
    }
}
