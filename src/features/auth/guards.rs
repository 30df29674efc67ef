//! Role authorization.
//!
//! Manager-scoped operations call [`authorize`] first thing instead of relying
//! on a role-specific route layer.

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;

/// Allow the actor through only if it holds `required_role`
pub fn authorize(actor: &AuthenticatedUser, required_role: &str) -> Result<()> {
    if actor.has_role(required_role) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Insufficient role".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "u-1".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_authorize() {
        assert!(authorize(&user(&["wb_manager"]), "wb_manager").is_ok());
        assert!(matches!(
            authorize(&user(&["employee"]), "wb_manager"),
            Err(AppError::Forbidden(_))
        ));
        assert!(authorize(&user(&[]), "wb_manager").is_err());
    }
}
