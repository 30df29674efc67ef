use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};

/// Request body shared by anonymous and identified intake
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReportDto {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Safety concern")]
    pub title: String,
    #[validate(length(min = 1, max = 20000))]
    pub description: String,
    /// Optional category UUID; unknown or inactive categories are ignored
    pub category_id: Option<String>,
    /// Must be `true`
    #[serde(default)]
    pub policy_accepted: bool,
    /// Version of the policy the reporter accepted
    pub policy_version: Option<String>,
}

impl CreateReportDto {
    /// Parse the category id, treating an empty value as absent
    pub fn parsed_category_id(&self) -> Result<Option<Uuid>> {
        match self.category_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|_| AppError::Validation("category_id must be a UUID".to_string())),
        }
    }
}

/// Returned once after anonymous intake. The reply token is never shown again.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnonymousReportCreatedDto {
    #[schema(example = "WB-2025-004217")]
    pub protocol: String,
    pub reply_token: String,
    pub reply_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentifiedReportCreatedDto {
    pub report_id: Uuid,
    pub protocol: String,
}
