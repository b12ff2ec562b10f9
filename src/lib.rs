pub mod achievement;
pub mod apportion;
pub mod classify;
pub mod daily;
pub mod dates;
pub mod loader;
pub mod logging;
pub mod models;
pub mod report;
pub mod store;
pub mod timeline;

pub use achievement::{
    achievement_rate, compute_course_achievement, compute_student_achievement,
    dashboard_summary, enrollment_progress,
};
pub use apportion::{apportion, Window};
pub use classify::{classify, is_planned};
pub use daily::daily_totals;
pub use store::{NewLog, RecordStore, StoreError};
pub use timeline::bucketize;
