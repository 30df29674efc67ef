use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Case;
use crate::shared::constants::AUDIT_CREATED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "wb_actor_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Reporter,
    Manager,
    /// Scheduled jobs
    System,
}

/// Append-only audit record. `case_id` is kept after the case is purged.
#[derive(Debug, Clone, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub case_id: Uuid,
    pub actor_role: ActorRole,
    pub action: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub case_id: Uuid,
    pub actor_role: ActorRole,
    pub action: &'static str,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    pub fn new(
        case_id: Uuid,
        actor_role: ActorRole,
        action: &'static str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id,
            actor_role,
            action,
            metadata: None,
            created_at,
        }
    }

    /// Entry recorded in the same write as the case itself
    pub fn case_created(case: &Case) -> Self {
        Self::new(case.id, ActorRole::Reporter, AUDIT_CREATED, case.created_at)
            .with_metadata(serde_json::json!({ "anonymous": case.is_anonymous }))
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
