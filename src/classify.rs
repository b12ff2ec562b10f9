use crate::models::{LessonLog, LogKind};

/// `kind` decides first; `registered_by` of `plan`/`planned` is the legacy marker.
/// Anything else counts as actual.
pub fn classify(log: &LessonLog) -> LogKind {
    if log.kind.eq_ignore_ascii_case("planned") {
        return LogKind::Planned;
    }

    let registered_by = log.registered_by.as_str();
    if registered_by.eq_ignore_ascii_case("plan") || registered_by.eq_ignore_ascii_case("planned") {
        return LogKind::Planned;
    }

    LogKind::Actual
}

pub fn is_planned(log: &LessonLog) -> bool {
    classify(log) == LogKind::Planned
}
