use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use serde_json::json;

use crate::core::error::{AppError, Result};
use crate::features::whistleblowing::models::{ActorRole, Case, NewAuditEntry};
use crate::features::whistleblowing::repository::CaseStore;
use crate::modules::storage::LocalStorage;
use crate::shared::clock::Clock;
use crate::shared::constants::AUDIT_PURGED;

use super::DailyJob;

/// Deletes cases that have been closed for longer than the retention period.
///
/// Only closed cases are ever considered. Rows go first in one store
/// transaction; attachment files are removed afterwards, best effort.
pub struct RetentionPurgeJob {
    store: Arc<dyn CaseStore>,
    storage: Arc<LocalStorage>,
    clock: Arc<dyn Clock>,
    retention: Months,
}

impl RetentionPurgeJob {
    pub fn new(
        store: Arc<dyn CaseStore>,
        storage: Arc<LocalStorage>,
        clock: Arc<dyn Clock>,
        retention_months: u32,
    ) -> Self {
        Self {
            store,
            storage,
            clock,
            retention: Months::new(retention_months),
        }
    }

    /// Purge every expired case, returning how many were removed
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let cutoff = now
            .checked_sub_months(self.retention)
            .ok_or_else(|| AppError::Internal("Retention cutoff out of range".to_string()))?;

        let candidates = self.store.list_closed_before(cutoff).await?;
        let total = candidates.len();
        let mut purged = 0;

        for case in candidates {
            match self.purge(&case, cutoff, now).await {
                Ok(true) => purged += 1,
                Ok(false) => {
                    tracing::info!(case_id = %case.id, "Case no longer eligible for purge");
                }
                Err(e) => {
                    tracing::error!(case_id = %case.id, "Failed to purge case: {:?}", e);
                }
            }
        }

        tracing::info!(candidates = total, purged, "Retention purge finished");
        Ok(purged)
    }

    async fn purge(
        &self,
        case: &Case,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let keys: Vec<String> = self
            .store
            .list_attachments(case.id)
            .await?
            .into_iter()
            .filter_map(|a| a.storage_key)
            .collect();

        if !self.store.purge_case(case.id, cutoff).await? {
            return Ok(false);
        }

        let mut files_removed = 0;
        for key in &keys {
            match self.storage.delete(key).await {
                Ok(()) => files_removed += 1,
                Err(e) => tracing::warn!(case_id = %case.id, "Failed to delete attachment file: {}", e),
            }
        }
        self.storage.remove_case_dir(case.id).await;

        self.store
            .append_audit(
                &NewAuditEntry::new(case.id, ActorRole::System, AUDIT_PURGED, now).with_metadata(
                    json!({
                        "protocol": case.protocol_code,
                        "closed_at": case.closed_at,
                        "attachments": keys.len(),
                        "files_removed": files_removed,
                    }),
                ),
            )
            .await?;

        tracing::info!(case_id = %case.id, protocol = %case.protocol_code, "Case purged");
        Ok(true)
    }
}

#[async_trait]
impl DailyJob for RetentionPurgeJob {
    fn name(&self) -> &'static str {
        "retention_purge"
    }

    async fn run_once(&self) -> Result<()> {
        self.purge_expired().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::whistleblowing::dtos::UpdateCaseDto;
    use crate::features::whistleblowing::models::CaseStatus;
    use crate::features::whistleblowing::services::AttachmentViewer;
    use crate::features::whistleblowing::test_support::{message, upload, Harness};
    use crate::shared::test_helpers::create_manager_user;
    use chrono::Duration;

    fn job(h: &Harness) -> RetentionPurgeJob {
        RetentionPurgeJob::new(h.store.clone(), h.storage.clone(), h.clock.clone(), 60)
    }

    async fn closed_case(h: &Harness, closed_at: DateTime<Utc>) -> Case {
        let case = h.anonymous_case().await;
        h.cases
            .update_case(
                &create_manager_user(),
                case.id,
                UpdateCaseDto {
                    status: Some(CaseStatus::ClosedUnsubstantiated),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        h.store.edit_case(case.id, |c| c.closed_at = Some(closed_at));
        case
    }

    fn cutoff(h: &Harness) -> DateTime<Utc> {
        h.clock.now().checked_sub_months(Months::new(60)).unwrap()
    }

    #[tokio::test]
    async fn test_retention_boundary() {
        let h = Harness::new();
        let kept = closed_case(&h, cutoff(&h) + Duration::days(1)).await;
        let expired = closed_case(&h, cutoff(&h) - Duration::days(1)).await;

        assert_eq!(job(&h).purge_expired().await.unwrap(), 1);

        assert!(h.store.find_case(kept.id).await.unwrap().is_some());
        assert!(h.store.find_case(expired.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_cases_are_never_purged() {
        let h = Harness::new();
        let open = h.anonymous_case().await;
        // An old closed_at left on an open case must not qualify
        h.store.edit_case(open.id, |c| {
            c.created_at -= Duration::days(365 * 10);
            c.closed_at = Some(c.created_at);
        });

        assert_eq!(job(&h).purge_expired().await.unwrap(), 0);
        assert!(h.store.find_case(open.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_removes_dependents_and_files() {
        let h = Harness::new();
        let case = closed_case(&h, cutoff(&h) - Duration::days(30)).await;
        h.threads
            .post_manager_message(&create_manager_user(), case.id, message("Closing note"))
            .await
            .unwrap();
        let attachment = h
            .attachments
            .upload(&case, AttachmentViewer::Manager, upload("a.pdf", b"%PDF"))
            .await
            .unwrap();
        let file = h
            .storage
            .root()
            .join(case.id.to_string())
            .join(attachment.id.to_string());
        assert!(file.exists());

        assert_eq!(job(&h).purge_expired().await.unwrap(), 1);

        assert_eq!(h.store.message_count(case.id), 0);
        assert_eq!(h.store.attachment_count(case.id), 0);
        assert_eq!(h.store.token_count(case.id), 0);
        assert!(!file.exists());
        assert!(!h.storage.root().join(case.id.to_string()).exists());
    }

    #[tokio::test]
    async fn test_audit_trail_survives_purge() {
        let h = Harness::new();
        let case = closed_case(&h, cutoff(&h) - Duration::days(1)).await;

        job(&h).purge_expired().await.unwrap();

        let audit = h.store.list_audit(case.id).await.unwrap();
        let last = audit.last().unwrap();
        assert_eq!(last.action, AUDIT_PURGED);
        assert_eq!(last.actor_role, ActorRole::System);
        assert_eq!(
            last.metadata.as_ref().unwrap()["protocol"],
            case.protocol_code.as_str()
        );
    }

    #[tokio::test]
    async fn test_missing_files_do_not_block_purge() {
        let h = Harness::new();
        let case = closed_case(&h, cutoff(&h) - Duration::days(1)).await;
        let attachment = h
            .attachments
            .upload(&case, AttachmentViewer::Manager, upload("a.pdf", b"%PDF"))
            .await
            .unwrap();
        h.storage
            .delete(&LocalStorage::key_for(case.id, attachment.id))
            .await
            .unwrap();

        assert_eq!(job(&h).purge_expired().await.unwrap(), 1);
        assert!(h.store.find_case(case.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scheduled_run_purges_expired_cases() {
        let h = Harness::new();
        let case = closed_case(&h, cutoff(&h) - Duration::days(1)).await;
        let job = job(&h);

        assert_eq!(job.name(), "retention_purge");
        tokio_test::assert_ok!(job.run_once().await);
        assert!(h.store.find_case(case.id).await.unwrap().is_none());
    }
}
