#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, Router};

#[cfg(test)]
pub const TEST_MANAGER_ROLE: &str = "wb_manager";

#[cfg(test)]
pub fn create_manager_user() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "mgr-1".to_string(),
        roles: vec![TEST_MANAGER_ROLE.to_string()],
    }
}

#[cfg(test)]
pub fn create_employee_user(sub: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        sub: sub.to_string(),
        roles: vec!["employee".to_string()],
    }
}

/// Stand in for the JWT layer by injecting a fixed user
#[cfg(test)]
pub fn with_user_auth(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}
