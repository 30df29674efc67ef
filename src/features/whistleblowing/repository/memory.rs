use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::whistleblowing::models::{
    Attachment, AuditEntry, AvStatus, Case, CaseChanges, CaseFilter, CaseStatus, Message,
    NewAttachment, NewAuditEntry, NewCase, NewMessage,
};

use super::CaseStore;

struct StoredToken {
    case_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    cases: Vec<Case>,
    messages: Vec<Message>,
    attachments: Vec<Attachment>,
    tokens: Vec<StoredToken>,
    audit: Vec<AuditEntry>,
}

/// Case store kept in process memory for service tests
#[derive(Default)]
pub struct InMemoryCaseStore {
    state: Mutex<State>,
    forced_collisions: AtomicUsize,
    fail_token_insert: AtomicBool,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` case inserts fail as protocol collisions
    pub fn force_protocol_collisions(&self, n: usize) {
        self.forced_collisions.store(n, Ordering::SeqCst);
    }

    /// Make the next case insert carrying a reply token fail at the token row
    pub fn fail_next_token_insert(&self) {
        self.fail_token_insert.store(true, Ordering::SeqCst);
    }

    pub fn case_count(&self) -> usize {
        self.state.lock().unwrap().cases.len()
    }

    pub fn message_count(&self, case_id: Uuid) -> usize {
        let state = self.state.lock().unwrap();
        state.messages.iter().filter(|m| m.case_id == case_id).count()
    }

    pub fn token_count(&self, case_id: Uuid) -> usize {
        let state = self.state.lock().unwrap();
        state.tokens.iter().filter(|t| t.case_id == case_id).count()
    }

    pub fn audit_entry_count(&self) -> usize {
        self.state.lock().unwrap().audit.len()
    }

    pub fn attachment_count(&self, case_id: Uuid) -> usize {
        let state = self.state.lock().unwrap();
        state.attachments.iter().filter(|a| a.case_id == case_id).count()
    }

    pub fn token_hashes(&self, case_id: Uuid) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .tokens
            .iter()
            .filter(|t| t.case_id == case_id)
            .map(|t| t.token_hash.clone())
            .collect()
    }

    /// Overwrite a case row directly, for fixtures that need specific timestamps
    pub fn edit_case(&self, id: Uuid, edit: impl FnOnce(&mut Case)) {
        let mut state = self.state.lock().unwrap();
        if let Some(case) = state.cases.iter_mut().find(|c| c.id == id) {
            edit(case);
        }
    }
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn insert_case(&self, data: &NewCase) -> Result<Case> {
        let forced = self
            .forced_collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Err(AppError::Conflict(
                "Protocol code already in use".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();
        if state
            .cases
            .iter()
            .any(|c| c.protocol_code == data.protocol_code)
        {
            return Err(AppError::Conflict(
                "Protocol code already in use".to_string(),
            ));
        }

        // Fails before any row is written, as a rolled back transaction would
        if data.reply_token.is_some() && self.fail_token_insert.swap(false, Ordering::SeqCst) {
            return Err(AppError::Internal("Failed to insert reply token".to_string()));
        }

        let case = Case {
            id: Uuid::new_v4(),
            protocol_code: data.protocol_code.clone(),
            title: data.title.clone(),
            description_enc: Some(data.description_enc.clone()),
            is_anonymous: data.is_anonymous,
            reporter_user_id: data.reporter_user_id.clone(),
            manager_id: data.manager_id.clone(),
            category_id: data.category_id,
            status: CaseStatus::Submitted,
            policy_accepted: data.policy_accepted,
            policy_version: data.policy_version.clone(),
            created_at: data.created_at,
            acknowledged_at: data.acknowledged_at,
            first_response_at: None,
            closed_at: None,
            last_update: data.created_at,
        };

        if let Some(token) = &data.reply_token {
            state.tokens.push(StoredToken {
                case_id: case.id,
                token_hash: token.token_hash.clone(),
                expires_at: token.expires_at,
            });
        }
        push_audit(&mut state, &NewAuditEntry::case_created(&case));
        state.cases.push(case.clone());
        Ok(case)
    }

    async fn find_case(&self, id: Uuid) -> Result<Option<Case>> {
        let state = self.state.lock().unwrap();
        Ok(state.cases.iter().find(|c| c.id == id).cloned())
    }

    async fn find_case_by_protocol(&self, protocol_code: &str) -> Result<Option<Case>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cases
            .iter()
            .find(|c| c.protocol_code == protocol_code)
            .cloned())
    }

    async fn list_manager_cases(
        &self,
        manager_id: &str,
        filter: &CaseFilter,
        limit: i64,
    ) -> Result<Vec<Case>> {
        let state = self.state.lock().unwrap();
        let needle = filter.search.as_ref().map(|q| q.to_lowercase());
        let mut cases: Vec<Case> = state
            .cases
            .iter()
            .filter(|c| c.manager_id == manager_id)
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .filter(|c| {
                needle.as_ref().is_none_or(|q| {
                    c.protocol_code.to_lowercase().contains(q)
                        || c.title.to_lowercase().contains(q)
                })
            })
            .cloned()
            .collect();
        cases.sort_by(|a, b| b.last_update.cmp(&a.last_update));
        cases.truncate(limit.max(0) as usize);
        Ok(cases)
    }

    async fn list_reporter_cases(&self, reporter_user_id: &str) -> Result<Vec<Case>> {
        let state = self.state.lock().unwrap();
        let mut cases: Vec<Case> = state
            .cases
            .iter()
            .filter(|c| !c.is_anonymous && c.reporter_user_id.as_deref() == Some(reporter_user_id))
            .cloned()
            .collect();
        cases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cases)
    }

    async fn apply_changes(
        &self,
        id: Uuid,
        changes: &CaseChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Case>> {
        let mut state = self.state.lock().unwrap();
        let Some(case) = state.cases.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(status) = changes.status {
            case.status = status;
            if status.is_closed() {
                case.closed_at.get_or_insert(now);
            } else {
                case.closed_at = None;
            }
        }
        if let Some(category_id) = changes.category_id {
            case.category_id = Some(category_id);
        }
        if changes.acknowledge {
            case.acknowledged_at.get_or_insert(now);
        }
        case.last_update = now;
        Ok(Some(case.clone()))
    }

    async fn record_first_response(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(case) = state.cases.iter_mut().find(|c| c.id == id) {
            case.first_response_at = Some(case.first_response_at.map_or(at, |t| t.min(at)));
            case.last_update = case.last_update.max(at);
        }
        Ok(())
    }

    async fn touch_case(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(case) = state.cases.iter_mut().find(|c| c.id == id) {
            case.last_update = at;
        }
        Ok(())
    }

    async fn insert_message(&self, data: &NewMessage) -> Result<Message> {
        let mut state = self.state.lock().unwrap();
        let message = Message {
            id: Uuid::new_v4(),
            case_id: data.case_id,
            sender_role: data.sender_role,
            body_enc: data.body_enc.clone(),
            created_at: data.created_at,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, case_id: Uuid) -> Result<Vec<Message>> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.case_id == case_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn has_valid_reply_token(
        &self,
        case_id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tokens
            .iter()
            .any(|t| t.case_id == case_id && t.token_hash == token_hash && t.expires_at > now))
    }

    async fn insert_attachment(&self, data: &NewAttachment) -> Result<Attachment> {
        let mut state = self.state.lock().unwrap();
        let attachment = Attachment {
            id: Uuid::new_v4(),
            case_id: data.case_id,
            original_filename: data.original_filename.clone(),
            mime_type: data.mime_type.clone(),
            size_bytes: data.size_bytes,
            content_hash: data.content_hash.clone(),
            storage_key: None,
            av_status: AvStatus::Pending,
            created_at: data.created_at,
        };
        state.attachments.push(attachment.clone());
        Ok(attachment)
    }

    async fn set_attachment_storage_key(&self, id: Uuid, storage_key: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(att) = state.attachments.iter_mut().find(|a| a.id == id) {
            att.storage_key = Some(storage_key.to_string());
        }
        Ok(())
    }

    async fn set_attachment_av_status(&self, id: Uuid, status: AvStatus) -> Result<Attachment> {
        let mut state = self.state.lock().unwrap();
        let att = state
            .attachments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound("Attachment not found".to_string()))?;
        att.av_status = status;
        Ok(att.clone())
    }

    async fn find_attachment(&self, case_id: Uuid, id: Uuid) -> Result<Option<Attachment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .attachments
            .iter()
            .find(|a| a.id == id && a.case_id == case_id)
            .cloned())
    }

    async fn list_attachments(&self, case_id: Uuid) -> Result<Vec<Attachment>> {
        let state = self.state.lock().unwrap();
        let mut list: Vec<Attachment> = state
            .attachments
            .iter()
            .filter(|a| a.case_id == case_id)
            .cloned()
            .collect();
        list.sort_by_key(|a| a.created_at);
        Ok(list)
    }

    async fn delete_attachment(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.attachments.len();
        state.attachments.retain(|a| a.id != id);
        Ok(state.attachments.len() < before)
    }

    async fn append_audit(&self, entry: &NewAuditEntry) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        push_audit(&mut state, entry);
        Ok(())
    }

    async fn list_audit(&self, case_id: Uuid) -> Result<Vec<AuditEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .audit
            .iter()
            .filter(|e| e.case_id == case_id)
            .cloned()
            .collect())
    }

    async fn list_unacknowledged(
        &self,
        manager_id: &str,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Case>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cases
            .iter()
            .filter(|c| {
                c.manager_id == manager_id
                    && c.acknowledged_at.is_none()
                    && c.created_at < created_before
            })
            .cloned()
            .collect())
    }

    async fn list_unanswered(
        &self,
        manager_id: &str,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Case>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cases
            .iter()
            .filter(|c| {
                c.manager_id == manager_id
                    && c.first_response_at.is_none()
                    && c.created_at < created_before
            })
            .cloned()
            .collect())
    }

    async fn list_closed_before(&self, closed_before: DateTime<Utc>) -> Result<Vec<Case>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cases
            .iter()
            .filter(|c| qualifies_for_purge(c, closed_before))
            .cloned()
            .collect())
    }

    async fn purge_case(&self, id: Uuid, closed_before: DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let qualifies = state
            .cases
            .iter()
            .any(|c| c.id == id && qualifies_for_purge(c, closed_before));
        if !qualifies {
            return Ok(false);
        }

        state.tokens.retain(|t| t.case_id != id);
        state.messages.retain(|m| m.case_id != id);
        state.attachments.retain(|a| a.case_id != id);
        state.cases.retain(|c| c.id != id);
        Ok(true)
    }
}

fn qualifies_for_purge(case: &Case, closed_before: DateTime<Utc>) -> bool {
    case.status.is_closed() && case.closed_at.is_some_and(|at| at < closed_before)
}

fn push_audit(state: &mut State, entry: &NewAuditEntry) {
    state.audit.push(AuditEntry {
        id: Uuid::new_v4(),
        case_id: entry.case_id,
        actor_role: entry.actor_role,
        action: entry.action.to_string(),
        metadata: entry.metadata.clone(),
        created_at: entry.created_at,
    });
}
