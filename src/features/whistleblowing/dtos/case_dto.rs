use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::whistleblowing::dtos::{AttachmentDto, MessageDto};
use crate::features::whistleblowing::models::{
    ActorRole, AuditEntry, Case, CaseChanges, CaseFilter, CaseStatus,
};

/// Query params for the manager case list
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CaseListQuery {
    /// Filter by status
    pub status: Option<CaseStatus>,
    /// Case-insensitive match on protocol code or title
    pub q: Option<String>,
}

impl From<CaseListQuery> for CaseFilter {
    fn from(q: CaseListQuery) -> Self {
        Self {
            status: q.status,
            search: q
                .q
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManagerCaseSummaryDto {
    pub id: Uuid,
    pub protocol: String,
    pub title: String,
    pub status: CaseStatus,
    pub is_anonymous: bool,
    pub category_id: Option<Uuid>,
    pub policy_version: String,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub last_update: DateTime<Utc>,
}

impl From<Case> for ManagerCaseSummaryDto {
    fn from(c: Case) -> Self {
        Self {
            id: c.id,
            protocol: c.protocol_code,
            title: c.title,
            status: c.status,
            is_anonymous: c.is_anonymous,
            category_id: c.category_id,
            policy_version: c.policy_version,
            created_at: c.created_at,
            acknowledged_at: c.acknowledged_at,
            first_response_at: c.first_response_at,
            closed_at: c.closed_at,
            last_update: c.last_update,
        }
    }
}

/// Identified reporter as shown to the case manager
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReporterIdentityDto {
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManagerCaseDetailDto {
    #[serde(flatten)]
    pub case: ManagerCaseSummaryDto,
    pub description: String,
    /// Always `null` for anonymous cases
    pub reporter: Option<ReporterIdentityDto>,
    pub messages: Vec<MessageDto>,
    pub attachments: Vec<AttachmentDto>,
}

/// Partial case update. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCaseDto {
    pub status: Option<CaseStatus>,
    pub category_id: Option<Uuid>,
    /// Stamp `acknowledged_at` if not already set
    pub acknowledge: Option<bool>,
}

impl From<UpdateCaseDto> for CaseChanges {
    fn from(dto: UpdateCaseDto) -> Self {
        Self {
            status: dto.status,
            category_id: dto.category_id,
            acknowledge: dto.acknowledge.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEntryDto {
    pub id: Uuid,
    pub actor_role: ActorRole,
    pub action: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditEntry> for AuditEntryDto {
    fn from(e: AuditEntry) -> Self {
        Self {
            id: e.id,
            actor_role: e.actor_role,
            action: e.action,
            metadata: e.metadata,
            created_at: e.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_search_is_dropped() {
        let filter: CaseFilter = CaseListQuery {
            status: Some(CaseStatus::Triage),
            q: Some("   ".to_string()),
        }
        .into();
        assert_eq!(filter.status, Some(CaseStatus::Triage));
        assert!(filter.search.is_none());
    }

    #[test]
    fn test_update_without_known_fields_is_empty() {
        let dto: UpdateCaseDto =
            serde_json::from_value(serde_json::json!({ "priority": "high" })).unwrap();
        assert!(CaseChanges::from(dto).is_empty());
    }
}
