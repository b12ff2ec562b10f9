use std::collections::HashSet;

use chrono::NaiveDate;

use crate::apportion::{apportion_enrollment, Window};
use crate::classify::is_planned;
use crate::dates::month_bounds;
use crate::models::{
    Course, CourseAchievement, DashboardSummary, Enrollment, EnrollmentProgress, LessonLog,
    Student, StudentAchievement,
};
use crate::store::RecordStore;

/// `actual / planned`, or `None` when nothing was planned.
pub fn achievement_rate(planned: f64, actual: f64) -> Option<f64> {
    if planned > 0.0 {
        Some(actual / planned)
    } else {
        None
    }
}

impl StudentAchievement<'_> {
    pub fn rate(&self) -> Option<f64> {
        achievement_rate(self.planned, self.actual)
    }
}

impl CourseAchievement<'_> {
    pub fn rate(&self) -> Option<f64> {
        achievement_rate(self.planned, self.actual)
    }
}

impl EnrollmentProgress<'_> {
    pub fn rate(&self) -> Option<f64> {
        achievement_rate(self.enrollment.planned_sessions, self.actual)
    }
}

fn planned_total<'a>(enrollments: impl Iterator<Item = &'a Enrollment>, window: Window) -> f64 {
    enrollments
        .map(|enrollment| apportion_enrollment(enrollment, window))
        .sum()
}

fn actual_total<'a>(logs: impl Iterator<Item = &'a LessonLog>, window: Window) -> f64 {
    logs.filter(|log| !is_planned(log) && window.contains(log.date))
        .map(|log| sanitize(log.count))
        .sum()
}

pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn compute_student_achievement<'a>(
    students: &'a [Student],
    enrollments: &[Enrollment],
    logs: &[LessonLog],
    window_start: Option<NaiveDate>,
    window_end: Option<NaiveDate>,
) -> Vec<StudentAchievement<'a>> {
    let window = Window::new(window_start, window_end).normalized();

    students
        .iter()
        .map(|student| {
            let id = student.student_id.as_str();
            let planned = planned_total(
                enrollments.iter().filter(|enrollment| enrollment.student_id == id),
                window,
            );
            let actual = actual_total(logs.iter().filter(|log| log.student_id == id), window);
            StudentAchievement {
                student,
                planned,
                actual,
            }
        })
        .collect()
}

pub fn compute_course_achievement<'a>(
    courses: &'a [Course],
    enrollments: &[Enrollment],
    logs: &[LessonLog],
    window_start: Option<NaiveDate>,
    window_end: Option<NaiveDate>,
) -> Vec<CourseAchievement<'a>> {
    let window = Window::new(window_start, window_end).normalized();

    courses
        .iter()
        .map(|course| {
            let id = course.course_id.as_str();
            let enrolled: Vec<&Enrollment> = enrollments
                .iter()
                .filter(|enrollment| enrollment.course_id == id)
                .collect();
            let student_count = enrolled
                .iter()
                .map(|enrollment| enrollment.student_id.as_str())
                .collect::<HashSet<_>>()
                .len();
            let planned = planned_total(enrolled.into_iter(), window);
            let actual = actual_total(logs.iter().filter(|log| log.course_id == id), window);
            CourseAchievement {
                course,
                student_count,
                planned,
                actual,
            }
        })
        .collect()
}

/// Unprorated progress for each of a student's enrollments, over all logged time.
pub fn enrollment_progress<'a>(
    store: &'a RecordStore,
    student_id: &str,
) -> Vec<EnrollmentProgress<'a>> {
    store
        .enrollments
        .iter()
        .filter(|enrollment| enrollment.student_id == student_id)
        .map(|enrollment| {
            let course = store.course(&enrollment.course_id);
            let actual = actual_total(
                store.logs.iter().filter(|log| {
                    log.student_id == student_id && log.course_id == enrollment.course_id
                }),
                Window::unbounded(),
            );
            EnrollmentProgress {
                enrollment,
                course,
                actual,
            }
        })
        .collect()
}

pub fn dashboard_summary(store: &RecordStore, today: NaiveDate) -> DashboardSummary {
    let active_students = store
        .students
        .iter()
        .filter(|student| student.status.is_active())
        .count();

    let (month_start, month_end) = month_bounds(today);
    let month_actual = actual_total(store.logs.iter(), Window::between(month_start, month_end));

    let per_student = store.student_achievement(Window::unbounded());
    let average_rate = if per_student.is_empty() {
        None
    } else {
        let rates: Vec<f64> = per_student.iter().filter_map(|row| row.rate()).collect();
        if rates.is_empty() {
            Some(0.0)
        } else {
            Some(rates.iter().sum::<f64>() / rates.len() as f64)
        }
    };

    DashboardSummary {
        active_students,
        month_actual,
        average_rate,
    }
}
