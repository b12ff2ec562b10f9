use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::{clamp, inclusive_day_count};
use crate::models::Enrollment;

/// Query window. A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Window {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Window { start, end }
    }

    pub fn unbounded() -> Self {
        Window::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Window::new(Some(start), Some(end))
    }

    /// Swaps the bounds when both are present and the end precedes the start.
    pub fn normalized(self) -> Self {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end < start => Window::between(end, start),
            _ => self,
        }
    }

    /// Undated entries never fall inside a window, bounded or not.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return false;
        };
        if self.start.is_some_and(|start| date < start) {
            return false;
        }
        if self.end.is_some_and(|end| date > end) {
            return false;
        }
        true
    }
}

/// Share of `total_planned` attributable to the window by inclusive day-count ratio.
///
/// Enrollments without a full span are attributed entirely to any window, and a
/// window missing either bound does not prorate. Inverted spans and windows are swapped.
pub fn apportion(
    total_planned: f64,
    course_start: Option<NaiveDate>,
    course_end: Option<NaiveDate>,
    window_start: Option<NaiveDate>,
    window_end: Option<NaiveDate>,
) -> f64 {
    if !total_planned.is_finite() || total_planned <= 0.0 {
        return 0.0;
    }

    let (Some(course_start), Some(course_end)) = (course_start, course_end) else {
        return total_planned;
    };
    let (course_start, course_end) = if course_end < course_start {
        (course_end, course_start)
    } else {
        (course_start, course_end)
    };

    let (Some(window_start), Some(window_end)) = (window_start, window_end) else {
        return total_planned;
    };
    let (window_start, window_end) = if window_end < window_start {
        (window_end, window_start)
    } else {
        (window_start, window_end)
    };

    if course_end < window_start || course_start > window_end {
        return 0.0;
    }

    let total_days = inclusive_day_count(course_start, course_end);
    let intersect_start = clamp(window_start, course_start, course_end);
    let intersect_end = clamp(window_end, course_start, course_end);
    let intersect_days = inclusive_day_count(intersect_start, intersect_end);

    if total_days > 0 {
        total_planned * intersect_days as f64 / total_days as f64
    } else {
        total_planned
    }
}

pub fn apportion_enrollment(enrollment: &Enrollment, window: Window) -> f64 {
    apportion(
        enrollment.planned_sessions,
        enrollment.start_date,
        enrollment.end_date,
        window.start,
        window.end,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    /// Twenty sessions planned from April through September (183 days).
    fn half_year(window_start: Option<NaiveDate>, window_end: Option<NaiveDate>) -> f64 {
        apportion(
            20.0,
            date(2024, 4, 1),
            date(2024, 9, 30),
            window_start,
            window_end,
        )
    }

    #[test]
    fn april_share_of_half_year_course() {
        let planned = half_year(date(2024, 4, 1), date(2024, 4, 30));
        assert!((planned - 20.0 * 30.0 / 183.0).abs() < 1e-9);
        assert!((planned - 3.28).abs() < 0.01);
    }

    #[test]
    fn covering_window_returns_total() {
        assert_eq!(half_year(date(2024, 1, 1), date(2024, 12, 31)), 20.0);
        assert_eq!(half_year(date(2024, 4, 1), date(2024, 9, 30)), 20.0);
    }

    #[test]
    fn disjoint_window_returns_zero() {
        assert_eq!(half_year(date(2024, 10, 1), date(2024, 10, 31)), 0.0);
        assert_eq!(half_year(date(2024, 1, 1), date(2024, 3, 31)), 0.0);
    }

    #[test]
    fn partial_overlap_is_strictly_between_and_grows_with_window() {
        let mut previous = 0.0;
        for end_month in 4..=9 {
            let planned = half_year(date(2024, 3, 15), date(2024, end_month, 15));
            assert!(planned > 0.0 && planned < 20.0);
            assert!(planned >= previous);
            previous = planned;
        }
    }

    #[test]
    fn missing_course_bound_ignores_window() {
        let april = (date(2024, 4, 1), date(2024, 4, 30));
        assert_eq!(
            apportion(12.0, None, date(2024, 9, 30), april.0, april.1),
            12.0
        );
        assert_eq!(
            apportion(
                12.0,
                date(2024, 4, 1),
                None,
                date(2030, 1, 1),
                date(2030, 1, 2)
            ),
            12.0
        );
        assert_eq!(apportion(12.0, None, None, None, None), 12.0);
    }

    #[test]
    fn missing_window_bound_returns_total() {
        assert_eq!(half_year(None, None), 20.0);
        assert_eq!(half_year(date(2025, 1, 1), None), 20.0);
    }

    #[test]
    fn non_positive_total_returns_zero() {
        assert_eq!(
            apportion(0.0, date(2024, 4, 1), date(2024, 9, 30), None, None),
            0.0
        );
        assert_eq!(apportion(-3.0, None, None, None, None), 0.0);
        assert_eq!(apportion(f64::NAN, None, None, None, None), 0.0);
    }

    #[test]
    fn inverted_course_span_is_swapped() {
        let straight = half_year(date(2024, 4, 1), date(2024, 4, 30));
        let inverted = apportion(
            20.0,
            date(2024, 9, 30),
            date(2024, 4, 1),
            date(2024, 4, 1),
            date(2024, 4, 30),
        );
        assert_eq!(straight, inverted);
    }

    #[test]
    fn inverted_window_is_swapped() {
        let straight = half_year(date(2024, 4, 1), date(2024, 4, 30));
        let inverted = half_year(date(2024, 4, 30), date(2024, 4, 1));
        assert_eq!(straight, inverted);
        assert!(inverted > 0.0 && inverted < 20.0);

        assert_eq!(half_year(date(2024, 12, 31), date(2024, 10, 1)), 0.0);
        assert_eq!(half_year(date(2024, 12, 31), date(2024, 1, 1)), 20.0);
    }

    #[test]
    fn single_day_course() {
        assert_eq!(
            apportion(
                2.0,
                date(2024, 4, 3),
                date(2024, 4, 3),
                date(2024, 4, 1),
                date(2024, 4, 30)
            ),
            2.0
        );
    }

    #[test]
    fn window_normalizes_and_filters() {
        let window = Window::new(date(2024, 4, 30), date(2024, 4, 1)).normalized();
        assert_eq!(window, Window::new(date(2024, 4, 1), date(2024, 4, 30)));
        assert!(window.contains(date(2024, 4, 1)));
        assert!(window.contains(date(2024, 4, 30)));
        assert!(!window.contains(date(2024, 5, 1)));
        assert!(!window.contains(None));
        assert!(Window::unbounded().contains(date(1999, 1, 1)));
        assert!(Window::new(date(2024, 4, 1), None).contains(date(2099, 1, 1)));
    }
}
