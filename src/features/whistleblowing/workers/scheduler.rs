//! Daily job scheduling at a fixed local wall-clock time

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use tokio::task::JoinHandle;

use crate::core::error::Result;
use crate::shared::clock::Clock;

#[async_trait]
pub trait DailyJob: Send + Sync {
    fn name(&self) -> &'static str;

    /// One full pass. Errors are logged by the scheduler and retried next day.
    async fn run_once(&self) -> Result<()>;
}

/// Time of day in a fixed UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    offset: FixedOffset,
    at: NaiveTime,
}

impl DailySchedule {
    /// `None` when `(hour, minute)` is not a valid time of day
    pub fn new(offset: FixedOffset, (hour, minute): (u32, u32)) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|at| Self { offset, at })
    }

    /// First scheduled instant strictly after `now`
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&self.offset).naive_local();
        let mut candidate = local.date().and_time(self.at);
        if candidate <= local {
            candidate += Duration::days(1);
        }
        let utc = candidate - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }
}

/// Run `job` every day at `schedule` until the process exits
pub fn spawn_daily(
    job: Arc<dyn DailyJob>,
    schedule: DailySchedule,
    clock: Arc<dyn Clock>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(job = job.name(), "Starting scheduled job");

        loop {
            let now = clock.now();
            let next = schedule.next_run_after(now);
            tracing::debug!(job = job.name(), next_run = %next, "Waiting for next run");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            if let Err(e) = job.run_once().await {
                tracing::error!(job = job.name(), "Scheduled job failed: {:?}", e);
            }
        }
    })
}
