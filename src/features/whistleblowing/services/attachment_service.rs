use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::whistleblowing::dtos::{AttachmentDownload, AttachmentDto, UploadedFile};
use crate::features::whistleblowing::models::{
    ActorRole, Attachment, AvStatus, Case, NewAttachment, NewAuditEntry,
};
use crate::features::whistleblowing::repository::CaseStore;
use crate::features::whistleblowing::services::WbSettings;
use crate::modules::antivirus::VirusScanner;
use crate::modules::crypto::tokens::content_hash;
use crate::modules::storage::LocalStorage;
use crate::shared::clock::Clock;
use crate::shared::constants::{
    AUDIT_ATTACHMENT_DELETED, AUDIT_ATTACHMENT_RESCANNED, AUDIT_ATTACHMENT_UPLOADED,
};
use crate::shared::validation::sanitize_filename;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
const MAX_MIME_TYPE_LENGTH: usize = 127;

/// Who is looking at a case's attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentViewer {
    /// Anonymous or identified reporter: clean files only
    Reporter,
    /// Case manager: every file regardless of scan outcome
    Manager,
}

impl AttachmentViewer {
    fn actor_role(self) -> ActorRole {
        match self {
            AttachmentViewer::Reporter => ActorRole::Reporter,
            AttachmentViewer::Manager => ActorRole::Manager,
        }
    }

    fn may_see(self, attachment: &Attachment) -> bool {
        self == AttachmentViewer::Manager || attachment.av_status == AvStatus::Clean
    }
}

/// Upload, scan and AV-gated download of case attachments.
///
/// Callers pass a [`Case`] they have already resolved through `CaseAccess`.
pub struct AttachmentService {
    store: Arc<dyn CaseStore>,
    storage: Arc<LocalStorage>,
    scanner: Arc<dyn VirusScanner>,
    clock: Arc<dyn Clock>,
    settings: Arc<WbSettings>,
}

impl AttachmentService {
    pub fn new(
        store: Arc<dyn CaseStore>,
        storage: Arc<LocalStorage>,
        scanner: Arc<dyn VirusScanner>,
        clock: Arc<dyn Clock>,
        settings: Arc<WbSettings>,
    ) -> Self {
        Self {
            store,
            storage,
            scanner,
            clock,
            settings,
        }
    }

    pub async fn list(&self, case: &Case, viewer: AttachmentViewer) -> Result<Vec<AttachmentDto>> {
        let attachments = self.store.list_attachments(case.id).await?;
        Ok(attachments
            .into_iter()
            .filter(|a| viewer.may_see(a))
            .map(Into::into)
            .collect())
    }

    /// Store and scan a new attachment. The verdict is known when this returns.
    pub async fn upload(
        &self,
        case: &Case,
        viewer: AttachmentViewer,
        file: UploadedFile,
    ) -> Result<AttachmentDto> {
        if file.bytes.is_empty() {
            return Err(AppError::Validation("File is empty".to_string()));
        }
        if file.bytes.len() > self.settings.max_attachment_size {
            return Err(AppError::Validation(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                self.settings.max_attachment_size,
                self.settings.max_attachment_size / 1024 / 1024
            )));
        }

        let now = self.clock.now();
        let pending = self
            .store
            .insert_attachment(&NewAttachment {
                case_id: case.id,
                original_filename: sanitize_filename(&file.filename),
                mime_type: normalize_mime_type(&file.content_type),
                size_bytes: file.bytes.len() as i64,
                content_hash: content_hash(&file.bytes),
                created_at: now,
            })
            .await?;

        // The key only exists once the row does
        let key = LocalStorage::key_for(case.id, pending.id);
        if let Err(e) = self.storage.write(&key, &file.bytes).await {
            if let Err(cleanup) = self.store.delete_attachment(pending.id).await {
                warn!(attachment_id = %pending.id, "Failed to remove orphaned attachment row: {}", cleanup);
            }
            return Err(e);
        }
        self.store.set_attachment_storage_key(pending.id, &key).await?;

        let attachment = self.scan(pending.id, &key).await?;

        self.store
            .append_audit(
                &NewAuditEntry::new(
                    case.id,
                    viewer.actor_role(),
                    AUDIT_ATTACHMENT_UPLOADED,
                    now,
                )
                .with_metadata(json!({
                    "attachment_id": attachment.id,
                    "size_bytes": attachment.size_bytes,
                    "av_status": attachment.av_status,
                })),
            )
            .await?;
        self.store.touch_case(case.id, now).await?;

        info!(
            case_id = %case.id,
            attachment_id = %attachment.id,
            av_status = %attachment.av_status,
            "Attachment uploaded"
        );

        Ok(attachment.into())
    }

    pub async fn download(
        &self,
        case: &Case,
        viewer: AttachmentViewer,
        attachment_id: Uuid,
    ) -> Result<AttachmentDownload> {
        let attachment = self.find(case, attachment_id).await?;

        if !viewer.may_see(&attachment) {
            return Err(AppError::Forbidden(
                "Attachment is not available for download".to_string(),
            ));
        }

        let key = attachment
            .storage_key
            .as_deref()
            .ok_or_else(|| AppError::NotFound("Attachment file not found".to_string()))?;
        let bytes = self.storage.read(key).await?;

        Ok(AttachmentDownload {
            filename: attachment.original_filename,
            mime_type: attachment.mime_type,
            bytes,
        })
    }

    /// Scan the stored bytes again (manager only)
    pub async fn rescan(&self, case: &Case, attachment_id: Uuid) -> Result<AttachmentDto> {
        let attachment = self.find(case, attachment_id).await?;
        let key = attachment
            .storage_key
            .as_deref()
            .ok_or_else(|| AppError::NotFound("Attachment file not found".to_string()))?;

        let previous = attachment.av_status;
        let updated = self.scan(attachment.id, key).await?;

        self.store
            .append_audit(
                &NewAuditEntry::new(
                    case.id,
                    ActorRole::Manager,
                    AUDIT_ATTACHMENT_RESCANNED,
                    self.clock.now(),
                )
                .with_metadata(json!({
                    "attachment_id": updated.id,
                    "previous": previous,
                    "av_status": updated.av_status,
                })),
            )
            .await?;

        info!(attachment_id = %updated.id, av_status = %updated.av_status, "Attachment rescanned");
        Ok(updated.into())
    }

    /// Remove bytes (best effort) and then the metadata row (manager only)
    pub async fn delete(&self, case: &Case, attachment_id: Uuid) -> Result<()> {
        let attachment = self.find(case, attachment_id).await?;

        if let Some(key) = attachment.storage_key.as_deref() {
            if let Err(e) = self.storage.delete(key).await {
                warn!(attachment_id = %attachment.id, "Failed to delete attachment bytes: {}", e);
            }
        }
        self.store.delete_attachment(attachment.id).await?;

        self.store
            .append_audit(
                &NewAuditEntry::new(
                    case.id,
                    ActorRole::Manager,
                    AUDIT_ATTACHMENT_DELETED,
                    self.clock.now(),
                )
                .with_metadata(json!({ "attachment_id": attachment.id })),
            )
            .await?;

        info!(case_id = %case.id, attachment_id = %attachment.id, "Attachment deleted");
        Ok(())
    }

    async fn find(&self, case: &Case, attachment_id: Uuid) -> Result<Attachment> {
        self.store
            .find_attachment(case.id, attachment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attachment not found".to_string()))
    }

    async fn scan(&self, attachment_id: Uuid, key: &str) -> Result<Attachment> {
        let path = self.storage.path_for(key)?;
        let verdict = self.scanner.scan(&path).await;
        self.store
            .set_attachment_av_status(attachment_id, verdict.into())
            .await
    }
}

fn normalize_mime_type(declared: &str) -> String {
    let mime = declared.trim();
    if mime.is_empty() || mime.len() > MAX_MIME_TYPE_LENGTH || mime.chars().any(char::is_control) {
        DEFAULT_MIME_TYPE.to_string()
    } else {
        mime.to_ascii_lowercase()
    }
}
