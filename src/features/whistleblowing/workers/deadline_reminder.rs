use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Months};

use crate::core::error::{AppError, Result};
use crate::features::whistleblowing::repository::CaseStore;
use crate::features::whistleblowing::services::{notices, ManagerResolver};
use crate::modules::notifier::{send_best_effort, Notifier};
use crate::shared::clock::Clock;

use super::DailyJob;

/// Protocol codes flagged by one reminder pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderSummary {
    pub unacknowledged: Vec<String>,
    pub unanswered: Vec<String>,
}

impl ReminderSummary {
    pub fn is_empty(&self) -> bool {
        self.unacknowledged.is_empty() && self.unanswered.is_empty()
    }
}

/// Notifies the case manager about cases past the acknowledgement or
/// feedback deadline. Never changes case state.
pub struct DeadlineReminderJob {
    store: Arc<dyn CaseStore>,
    managers: Arc<ManagerResolver>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    ack_within: Duration,
    respond_within: Months,
    extra_recipients: Vec<String>,
}

impl DeadlineReminderJob {
    pub fn new(
        store: Arc<dyn CaseStore>,
        managers: Arc<ManagerResolver>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        ack_reminder_days: i64,
        response_reminder_months: u32,
        extra_recipients: Vec<String>,
    ) -> Self {
        Self {
            store,
            managers,
            notifier,
            clock,
            ack_within: Duration::days(ack_reminder_days),
            respond_within: Months::new(response_reminder_months),
            extra_recipients,
        }
    }

    /// Evaluate both deadline rules and send one digest if anything is overdue
    pub async fn remind(&self) -> Result<ReminderSummary> {
        let manager = self.managers.resolve().await?;
        let now = self.clock.now();

        let ack_cutoff = now - self.ack_within;
        let response_cutoff = now
            .checked_sub_months(self.respond_within)
            .ok_or_else(|| AppError::Internal("Response reminder cutoff out of range".to_string()))?;

        let summary = ReminderSummary {
            unacknowledged: self
                .store
                .list_unacknowledged(&manager.id, ack_cutoff)
                .await?
                .into_iter()
                .map(|c| c.protocol_code)
                .collect(),
            unanswered: self
                .store
                .list_unanswered(&manager.id, response_cutoff)
                .await?
                .into_iter()
                .map(|c| c.protocol_code)
                .collect(),
        };

        if summary.is_empty() {
            tracing::info!("Deadline reminder: no overdue cases");
            return Ok(summary);
        }

        let to = ManagerResolver::recipients(&manager, &self.extra_recipients);
        let notification =
            notices::deadline_digest(to, &summary.unacknowledged, &summary.unanswered);
        let delivered = send_best_effort(self.notifier.as_ref(), &notification).await;

        tracing::info!(
            unacknowledged = summary.unacknowledged.len(),
            unanswered = summary.unanswered.len(),
            delivered,
            "Deadline reminder sent"
        );
        Ok(summary)
    }
}

#[async_trait]
impl DailyJob for DeadlineReminderJob {
    fn name(&self) -> &'static str {
        "deadline_reminder"
    }

    async fn run_once(&self) -> Result<()> {
        self.remind().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::whistleblowing::test_support::{message, report_dto, Harness};
    use crate::shared::test_helpers::{create_employee_user, create_manager_user};

    fn job(h: &Harness) -> DeadlineReminderJob {
        DeadlineReminderJob::new(
            h.store.clone(),
            h.managers.clone(),
            h.notifier.clone(),
            h.clock.clone(),
            7,
            3,
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn test_nothing_overdue_sends_nothing() {
        let h = Harness::new();
        h.intake
            .create_identified_report(&create_employee_user("emp-1"), report_dto("t"))
            .await
            .unwrap();
        h.settle().await;
        let before = h.notifier.sent().len();

        h.clock.advance(Duration::days(6));
        let summary = job(&h).remind().await.unwrap();
        assert!(summary.is_empty());
        assert_eq!(h.notifier.sent().len(), before);
    }

    #[tokio::test]
    async fn test_unacknowledged_identified_case_is_flagged() {
        let h = Harness::new();
        let created = h
            .intake
            .create_identified_report(&create_employee_user("emp-1"), report_dto("t"))
            .await
            .unwrap();
        let anonymous = h.anonymous_case().await;
        h.settle().await;

        h.clock.advance(Duration::days(8));
        let summary = job(&h).remind().await.unwrap();
        assert_eq!(summary.unacknowledged, vec![created.protocol.clone()]);
        assert!(!summary.unacknowledged.contains(&anonymous.protocol_code));
        assert!(summary.unanswered.is_empty());

        let digest = h.notifier.sent().pop().unwrap();
        assert_eq!(digest.to, vec!["wb-manager@example.com"]);
        assert!(digest.body.contains(&created.protocol));
    }

    #[tokio::test]
    async fn test_unanswered_rule_is_independent() {
        let h = Harness::new();
        let answered = h.anonymous_case().await;
        let silent = h.anonymous_case().await;
        h.threads
            .post_manager_message(&create_manager_user(), answered.id, message("On it"))
            .await
            .unwrap();

        h.clock.advance(Duration::days(93));
        let summary = job(&h).remind().await.unwrap();
        assert!(summary.unacknowledged.is_empty());
        assert_eq!(summary.unanswered, vec![silent.protocol_code]);
    }

    #[tokio::test]
    async fn test_reminder_does_not_touch_cases() {
        let h = Harness::new();
        let case = h.anonymous_case().await;

        h.clock.advance(Duration::days(120));
        job(&h).remind().await.unwrap();

        let after = h.store.find_case(case.id).await.unwrap().unwrap();
        assert_eq!(after.last_update, case.last_update);
        assert_eq!(after.status, case.status);
        assert_eq!(h.store.list_audit(case.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_manager_fails_the_run() {
        let h = Harness::without_manager();
        assert!(matches!(
            job(&h).run_once().await,
            Err(AppError::Configuration(_))
        ));
    }
}
