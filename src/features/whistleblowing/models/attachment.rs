use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Antivirus state of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "wb_av_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AvStatus {
    Pending,
    Clean,
    Quarantined,
}

impl std::fmt::Display for AvStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvStatus::Pending => write!(f, "pending"),
            AvStatus::Clean => write!(f, "clean"),
            AvStatus::Quarantined => write!(f, "quarantined"),
        }
    }
}

/// Database model for an attachment
#[derive(Debug, Clone, FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub case_id: Uuid,
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    /// Hex SHA-256 of the plaintext bytes
    pub content_hash: String,
    /// `None` until the bytes have been written
    pub storage_key: Option<String>,
    pub av_status: AvStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub case_id: Uuid,
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}
