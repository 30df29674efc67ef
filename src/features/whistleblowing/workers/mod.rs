mod deadline_reminder;
mod retention_purge;
mod scheduler;

pub use deadline_reminder::DeadlineReminderJob;
pub use retention_purge::RetentionPurgeJob;
pub use scheduler::{spawn_daily, DailyJob, DailySchedule};
