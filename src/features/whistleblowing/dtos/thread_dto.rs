use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::whistleblowing::models::{Case, CaseStatus, SenderRole};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PostMessageDto {
    #[validate(length(min = 1, max = 20000))]
    pub body: String,
}

/// Decrypted thread message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageDto {
    pub id: Uuid,
    pub sender_role: SenderRole,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// What an anonymous reporter sees after presenting protocol and reply token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnonymousThreadDto {
    pub protocol: String,
    pub title: String,
    pub status: CaseStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReporterCaseSummaryDto {
    pub id: Uuid,
    pub protocol: String,
    pub title: String,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl From<Case> for ReporterCaseSummaryDto {
    fn from(c: Case) -> Self {
        Self {
            id: c.id,
            protocol: c.protocol_code,
            title: c.title,
            status: c.status,
            created_at: c.created_at,
            last_update: c.last_update,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReporterCaseDetailDto {
    #[serde(flatten)]
    pub case: ReporterCaseSummaryDto,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub messages: Vec<MessageDto>,
}
