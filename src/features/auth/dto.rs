use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::AuthenticatedUser;

/// DTO for /auth/me response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponseDto {
    pub sub: String,
    pub roles: Vec<String>,
    /// Whether the caller may use the case manager console
    pub is_case_manager: bool,
}

impl MeResponseDto {
    pub fn new(user: AuthenticatedUser, manager_role: &str) -> Self {
        let is_case_manager = user.has_role(manager_role);
        Self {
            sub: user.sub,
            roles: user.roles,
            is_case_manager,
        }
    }
}
