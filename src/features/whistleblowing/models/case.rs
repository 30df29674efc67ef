use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use super::IssuedReplyToken;

/// Case status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "wb_case_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Submitted,
    Triage,
    InReview,
    NeedInfo,
    ClosedSubstantiated,
    ClosedUnsubstantiated,
    ClosedOther,
}

impl CaseStatus {
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            CaseStatus::ClosedSubstantiated
                | CaseStatus::ClosedUnsubstantiated
                | CaseStatus::ClosedOther
        )
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStatus::Submitted => write!(f, "submitted"),
            CaseStatus::Triage => write!(f, "triage"),
            CaseStatus::InReview => write!(f, "in_review"),
            CaseStatus::NeedInfo => write!(f, "need_info"),
            CaseStatus::ClosedSubstantiated => write!(f, "closed_substantiated"),
            CaseStatus::ClosedUnsubstantiated => write!(f, "closed_unsubstantiated"),
            CaseStatus::ClosedOther => write!(f, "closed_other"),
        }
    }
}

/// Database model for a whistleblowing case
#[derive(Debug, Clone, FromRow)]
pub struct Case {
    pub id: Uuid,
    pub protocol_code: String,
    pub title: String,
    /// Encrypted [`DescriptionPayload`]
    pub description_enc: Option<Vec<u8>>,
    pub is_anonymous: bool,
    pub reporter_user_id: Option<String>,
    pub manager_id: String,
    pub category_id: Option<Uuid>,
    pub status: CaseStatus,
    pub policy_accepted: bool,
    pub policy_version: String,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub last_update: DateTime<Utc>,
}

/// Plaintext shape of the encrypted description column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DescriptionPayload {
    pub description: String,
}

/// Data for creating a new case, with the reply token issued to an anonymous reporter
#[derive(Debug, Clone)]
pub struct NewCase {
    pub protocol_code: String,
    pub title: String,
    pub description_enc: Vec<u8>,
    pub is_anonymous: bool,
    pub reporter_user_id: Option<String>,
    pub manager_id: String,
    pub category_id: Option<Uuid>,
    pub policy_accepted: bool,
    pub policy_version: String,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub reply_token: Option<IssuedReplyToken>,
}

/// Partial update applied by the case manager
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseChanges {
    pub status: Option<CaseStatus>,
    pub category_id: Option<Uuid>,
    pub acknowledge: bool,
}

impl CaseChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.category_id.is_none() && !self.acknowledge
    }
}

/// Manager case list filter
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    /// Case-insensitive substring of protocol code or title
    pub search: Option<String>,
}
