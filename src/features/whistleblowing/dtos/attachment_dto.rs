use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::whistleblowing::models::{Attachment, AvStatus};

/// Multipart upload form (for OpenAPI documentation only).
/// The handler reads the `file` field with axum's Multipart extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadAttachmentDto {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// File received from a client, before any checks
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Attachment metadata. The storage key is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentDto {
    pub id: Uuid,
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub content_hash: String,
    pub av_status: AvStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentDto {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id,
            original_filename: a.original_filename,
            mime_type: a.mime_type,
            size_bytes: a.size_bytes,
            content_hash: a.content_hash,
            av_status: a.av_status,
            created_at: a.created_at,
        }
    }
}

/// Bytes and headers for a download response
#[derive(Debug, Clone)]
pub struct AttachmentDownload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteAttachmentResponseDto {
    pub deleted: bool,
}
