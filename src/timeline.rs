use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::achievement::sanitize;
use crate::apportion::Window;
use crate::classify::is_planned;
use crate::dates::week_start;
use crate::models::{LessonLog, TimelineBucket, TimelineUnit};

pub fn bucket_key(date: NaiveDate, unit: TimelineUnit) -> String {
    match unit {
        TimelineUnit::Day => date.format("%Y-%m-%d").to_string(),
        TimelineUnit::Week => week_start(date).format("%Y-%m-%d").to_string(),
        TimelineUnit::Month => date.format("%Y-%m").to_string(),
    }
}

/// Sums actual counts per bucket. Keys sort lexicographically, which is also
/// chronological for every unit.
pub fn bucketize(
    logs: &[LessonLog],
    window_start: Option<NaiveDate>,
    window_end: Option<NaiveDate>,
    unit: TimelineUnit,
) -> Vec<TimelineBucket> {
    let window = Window::new(window_start, window_end).normalized();
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();

    for log in logs {
        if is_planned(log) || !window.contains(log.date) {
            continue;
        }
        let Some(date) = log.date else {
            continue;
        };
        *buckets.entry(bucket_key(date, unit)).or_insert(0.0) += sanitize(log.count);
    }

    tracing::trace!(buckets = buckets.len(), ?unit, "bucketized timeline");

    buckets
        .into_iter()
        .map(|(key, total)| TimelineBucket { key, total })
        .collect()
}
