use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::achievement::sanitize;
use crate::classify::is_planned;
use crate::models::{DayTotals, LessonLog};

/// Per-day planned/actual totals of one student for a calendar month
/// (`month0` is zero-based). Days without logs are absent.
pub fn daily_totals(
    logs: &[LessonLog],
    student_id: &str,
    year: i32,
    month0: u32,
) -> BTreeMap<NaiveDate, DayTotals> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();

    for log in logs.iter().filter(|log| log.student_id == student_id) {
        let Some(date) = log.date else {
            continue;
        };
        if date.year() != year || date.month0() != month0 {
            continue;
        }

        let totals = days.entry(date).or_default();
        let count = sanitize(log.count);
        if is_planned(log) {
            totals.planned += count;
        } else {
            totals.actual += count;
        }
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn log(
        student_id: &str,
        day: NaiveDate,
        count: f64,
        kind: &str,
        registered_by: &str,
    ) -> LessonLog {
        LessonLog {
            log_id: "log".to_string(),
            date: Some(day),
            student_id: student_id.to_string(),
            course_id: "C001".to_string(),
            count,
            registered_by: registered_by.to_string(),
            created_at: None,
            kind: kind.to_string(),
        }
    }

    #[test]
    fn splits_planned_and_actual_per_day() {
        let logs = vec![
            log("S001", date(2024, 4, 5), 2.0, "actual", "teacher1"),
            log("S001", date(2024, 4, 5), 1.0, "planned", "teacher1"),
            log("S001", date(2024, 4, 5), 3.0, "", "plan"),
            log("S001", date(2024, 4, 9), 1.0, "actual", "S001"),
        ];

        let days = daily_totals(&logs, "S001", 2024, 3);
        assert_eq!(days.len(), 2);
        assert_eq!(days[&date(2024, 4, 5)], DayTotals { planned: 4.0, actual: 2.0 });
        assert_eq!(days[&date(2024, 4, 9)], DayTotals { planned: 0.0, actual: 1.0 });
    }

    #[test]
    fn ignores_other_students_and_months() {
        let logs = vec![
            log("S002", date(2024, 4, 5), 2.0, "actual", "teacher1"),
            log("S001", date(2024, 5, 5), 2.0, "actual", "teacher1"),
            log("S001", date(2023, 4, 5), 2.0, "actual", "teacher1"),
        ];
        assert!(daily_totals(&logs, "S001", 2024, 3).is_empty());
    }
}
