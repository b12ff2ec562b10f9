use std::fmt::Write;

use crate::achievement::dashboard_summary;
use crate::apportion::Window;
use crate::models::TimelineUnit;
use crate::store::RecordStore;

/// `NN%`, or `-` when the rate is undefined.
pub fn format_percent(rate: Option<f64>) -> String {
    match rate {
        Some(value) if value.is_finite() => format!("{:.0}%", value * 100.0),
        _ => "-".to_string(),
    }
}

fn window_label(window: Window) -> String {
    match (window.start, window.end) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        (Some(start), None) => format!("since {start}"),
        (None, Some(end)) => format!("until {end}"),
        (None, None) => "all time".to_string(),
    }
}

pub fn build_report(
    store: &RecordStore,
    window: Window,
    unit: TimelineUnit,
    today: chrono::NaiveDate,
) -> String {
    let students = store.student_achievement(window);
    let courses = store.course_achievement(window);
    let timeline = store.timeline(window, unit);
    let summary = dashboard_summary(store, today);

    let mut output = String::new();

    let _ = writeln!(output, "# Lesson Progress Report");
    let _ = writeln!(output, "Generated for {} on {}", window_label(window), today);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Active students: {}", summary.active_students);
    let _ = writeln!(output, "- Sessions this month: {:.1}", summary.month_actual);
    let _ = writeln!(
        output,
        "- Average achievement: {}",
        format_percent(summary.average_rate)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");

    if students.is_empty() {
        let _ = writeln!(output, "No students recorded.");
    } else {
        let _ = writeln!(output, "| Student | Grade | Planned | Actual | Rate |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for row in students.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {:.1} | {:.1} | {} |",
                row.student.student_id,
                row.student.grade,
                row.planned,
                row.actual,
                format_percent(row.rate())
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Courses");

    if courses.is_empty() {
        let _ = writeln!(output, "No courses recorded.");
    } else {
        let _ = writeln!(output, "| Course | Name | Students | Planned | Actual | Rate |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for row in courses.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {:.1} | {:.1} | {} |",
                row.course.course_id,
                row.course.course_name,
                row.student_count,
                row.planned,
                row.actual,
                format_percent(row.rate())
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Timeline ({})", unit_label(unit));

    if timeline.is_empty() {
        let _ = writeln!(output, "No actual sessions logged in this window.");
    } else {
        for bucket in timeline.iter() {
            let _ = writeln!(output, "- {}: {:.0}", bucket.key, bucket.total);
        }
    }

    output
}

fn unit_label(unit: TimelineUnit) -> &'static str {
    match unit {
        TimelineUnit::Day => "daily",
        TimelineUnit::Week => "weekly",
        TimelineUnit::Month => "monthly",
    }
}
