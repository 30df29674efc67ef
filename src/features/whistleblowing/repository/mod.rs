//! Case store: persistence for cases, messages, attachments, reply tokens and
//! the audit trail.

#[cfg(test)]
mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::whistleblowing::models::{
    Attachment, AuditEntry, AvStatus, Case, CaseChanges, CaseFilter, Message, NewAttachment,
    NewAuditEntry, NewCase, NewMessage,
};

#[cfg(test)]
pub use memory::InMemoryCaseStore;
pub use postgres::PgCaseStore;

#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Insert a case together with its reply token, if any, and the creation
    /// audit entry. Either all rows are written or none are. A protocol code
    /// collision yields `AppError::Conflict`.
    async fn insert_case(&self, data: &NewCase) -> Result<Case>;

    async fn find_case(&self, id: Uuid) -> Result<Option<Case>>;

    async fn find_case_by_protocol(&self, protocol_code: &str) -> Result<Option<Case>>;

    /// Cases owned by a manager, most recently updated first
    async fn list_manager_cases(
        &self,
        manager_id: &str,
        filter: &CaseFilter,
        limit: i64,
    ) -> Result<Vec<Case>>;

    /// Cases filed by an identified reporter, newest first
    async fn list_reporter_cases(&self, reporter_user_id: &str) -> Result<Vec<Case>>;

    /// Apply a manager update. Returns `None` when the case does not exist.
    async fn apply_changes(
        &self,
        id: Uuid,
        changes: &CaseChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Case>>;

    /// Keep the earliest manager response time seen for the case
    async fn record_first_response(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn touch_case(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn insert_message(&self, data: &NewMessage) -> Result<Message>;

    /// Messages of a case, oldest first
    async fn list_messages(&self, case_id: Uuid) -> Result<Vec<Message>>;

    /// Whether an unexpired token with this hash exists for the case
    async fn has_valid_reply_token(
        &self,
        case_id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Insert an attachment row in `pending` state without a storage key
    async fn insert_attachment(&self, data: &NewAttachment) -> Result<Attachment>;

    async fn set_attachment_storage_key(&self, id: Uuid, storage_key: &str) -> Result<()>;

    async fn set_attachment_av_status(&self, id: Uuid, status: AvStatus) -> Result<Attachment>;

    async fn find_attachment(&self, case_id: Uuid, id: Uuid) -> Result<Option<Attachment>>;

    /// Attachments of a case, oldest first
    async fn list_attachments(&self, case_id: Uuid) -> Result<Vec<Attachment>>;

    async fn delete_attachment(&self, id: Uuid) -> Result<bool>;

    async fn append_audit(&self, entry: &NewAuditEntry) -> Result<()>;

    /// Audit entries of a case, oldest first
    async fn list_audit(&self, case_id: Uuid) -> Result<Vec<AuditEntry>>;

    /// Cases never acknowledged and created before the cutoff
    async fn list_unacknowledged(
        &self,
        manager_id: &str,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Case>>;

    /// Cases without a manager response and created before the cutoff
    async fn list_unanswered(
        &self,
        manager_id: &str,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Case>>;

    /// Cases closed before the cutoff
    async fn list_closed_before(&self, closed_before: DateTime<Utc>) -> Result<Vec<Case>>;

    /// Atomically delete a case with its messages, attachments and reply tokens.
    ///
    /// The closed-age predicate is re-checked inside the transaction; returns
    /// `false` when the case no longer qualifies or is already gone. Audit
    /// entries are kept.
    async fn purge_case(&self, id: Uuid, closed_before: DateTime<Utc>) -> Result<bool>;
}
