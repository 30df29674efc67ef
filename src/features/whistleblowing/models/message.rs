use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "wb_sender_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    Reporter,
    Manager,
}

/// Database model for a thread message
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub case_id: Uuid,
    pub sender_role: SenderRole,
    /// Encrypted [`MessagePayload`]
    pub body_enc: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagePayload {
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub case_id: Uuid,
    pub sender_role: SenderRole,
    pub body_enc: Vec<u8>,
    pub created_at: DateTime<Utc>,
}
