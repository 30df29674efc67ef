use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::whistleblowing::handlers::{self, WbState};

/// Multipart framing allowance on top of the attachment size cap
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Anonymous reporter routes (no auth; reply token in `X-Reply-Token`)
pub fn public_routes(state: WbState, max_attachment_size: usize) -> Router {
    Router::new()
        .route(
            "/api/wb/anonymous/reports",
            post(handlers::create_anonymous_report),
        )
        .route(
            "/api/wb/anonymous/{protocol}/thread",
            get(handlers::get_anonymous_thread),
        )
        .route(
            "/api/wb/anonymous/{protocol}/messages",
            post(handlers::post_anonymous_message),
        )
        .route(
            "/api/wb/anonymous/{protocol}/attachments",
            get(handlers::list_anonymous_attachments).post(handlers::upload_anonymous_attachment),
        )
        .route(
            "/api/wb/anonymous/{protocol}/attachments/{id}",
            get(handlers::download_anonymous_attachment),
        )
        .layer(DefaultBodyLimit::max(max_attachment_size + MULTIPART_OVERHEAD))
        .with_state(state)
}

/// Identified reporter and case manager routes
///
/// Auth middleware is applied by the caller
pub fn protected_routes(state: WbState, max_attachment_size: usize) -> Router {
    Router::new()
        // Identified reporter
        .route(
            "/api/wb/reports",
            post(handlers::create_identified_report).get(handlers::list_my_reports),
        )
        .route("/api/wb/reports/{id}", get(handlers::get_my_report))
        .route(
            "/api/wb/reports/{id}/messages",
            post(handlers::post_my_message),
        )
        .route(
            "/api/wb/reports/{id}/attachments",
            get(handlers::list_my_attachments).post(handlers::upload_my_attachment),
        )
        .route(
            "/api/wb/reports/{id}/attachments/{attachment_id}",
            get(handlers::download_my_attachment),
        )
        // Case manager
        .route("/api/wb/manager/cases", get(handlers::list_cases))
        .route(
            "/api/wb/manager/cases/protocol/{code}",
            get(handlers::find_case_by_protocol),
        )
        .route(
            "/api/wb/manager/cases/{id}",
            get(handlers::get_case).patch(handlers::update_case),
        )
        .route(
            "/api/wb/manager/cases/{id}/messages",
            post(handlers::post_manager_message),
        )
        .route(
            "/api/wb/manager/cases/{id}/audit",
            get(handlers::list_case_audit),
        )
        .route(
            "/api/wb/manager/cases/{id}/attachments",
            get(handlers::list_case_attachments).post(handlers::upload_case_attachment),
        )
        .route(
            "/api/wb/manager/cases/{id}/attachments/{attachment_id}",
            get(handlers::download_case_attachment).delete(handlers::delete_case_attachment),
        )
        .route(
            "/api/wb/manager/cases/{id}/attachments/{attachment_id}/rescan",
            post(handlers::rescan_case_attachment),
        )
        .layer(DefaultBodyLimit::max(max_attachment_size + MULTIPART_OVERHEAD))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RateLimitConfig;
    use crate::features::whistleblowing::test_support::Harness;
    use crate::shared::test_helpers::{create_employee_user, create_manager_user, with_user_auth};
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    const MAX_UPLOAD: usize = 1024;

    fn public_server(h: &Harness, limits: RateLimitConfig) -> TestServer {
        TestServer::new(public_routes(h.state(limits), MAX_UPLOAD)).unwrap()
    }

    fn reply_token(token: &str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-reply-token"),
            HeaderValue::from_str(token).unwrap(),
        )
    }

    fn report_body() -> Value {
        json!({
            "title": "Safety concern",
            "description": "Blocked fire exit",
            "policy_accepted": true
        })
    }

    #[tokio::test]
    async fn test_anonymous_intake_is_rate_limited() {
        let h = Harness::new();
        let server = public_server(
            &h,
            RateLimitConfig {
                reports_max: 2,
                ..RateLimitConfig::default()
            },
        );

        for _ in 0..2 {
            server
                .post("/api/wb/anonymous/reports")
                .json(&report_body())
                .await
                .assert_status(StatusCode::CREATED);
        }
        server
            .post("/api/wb/anonymous/reports")
            .json(&report_body())
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(h.store.case_count(), 2);
    }

    #[tokio::test]
    async fn test_anonymous_thread_requires_reply_token() {
        let h = Harness::new();
        let server = public_server(&h, RateLimitConfig::default());

        let created: Value = server
            .post("/api/wb/anonymous/reports")
            .json(&report_body())
            .await
            .json();
        let protocol = created["data"]["protocol"].as_str().unwrap().to_string();
        let token = created["data"]["reply_token"].as_str().unwrap().to_string();
        let path = format!("/api/wb/anonymous/{}/thread", protocol);

        server
            .get(&path)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let (name, value) = reply_token("not-the-token");
        server
            .get(&path)
            .add_header(name, value)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let (name, value) = reply_token(&token);
        let response = server.get(&path).add_header(name, value).await;
        response.assert_status_ok();
        let thread: Value = response.json();
        assert_eq!(thread["data"]["description"], "Blocked fire exit");
    }

    #[tokio::test]
    async fn test_pending_upload_cannot_be_downloaded_anonymously() {
        let h = Harness::new();
        let server = public_server(&h, RateLimitConfig::default());

        let created: Value = server
            .post("/api/wb/anonymous/reports")
            .json(&report_body())
            .await
            .json();
        let protocol = created["data"]["protocol"].as_str().unwrap().to_string();
        let token = created["data"]["reply_token"].as_str().unwrap().to_string();

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"evidence".to_vec())
                .file_name("evidence.txt")
                .mime_type("text/plain"),
        );
        let (name, value) = reply_token(&token);
        let uploaded = server
            .post(&format!("/api/wb/anonymous/{}/attachments", protocol))
            .add_header(name, value)
            .multipart(form)
            .await;
        uploaded.assert_status(StatusCode::CREATED);
        let attachment: Value = uploaded.json();
        assert_eq!(attachment["data"]["av_status"], "pending");

        let (name, value) = reply_token(&token);
        server
            .get(&format!(
                "/api/wb/anonymous/{}/attachments/{}",
                protocol,
                attachment["data"]["id"].as_str().unwrap()
            ))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_manager_routes_are_role_gated() {
        let h = Harness::new();
        h.anonymous_case().await;

        let employee = TestServer::new(with_user_auth(
            protected_routes(h.state(RateLimitConfig::default()), MAX_UPLOAD),
            create_employee_user("emp-1"),
        ))
        .unwrap();
        employee
            .get("/api/wb/manager/cases")
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let manager = TestServer::new(with_user_auth(
            protected_routes(h.state(RateLimitConfig::default()), MAX_UPLOAD),
            create_manager_user(),
        ))
        .unwrap();
        let response = manager.get("/api/wb/manager/cases").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["meta"]["total"], 1);
    }
}
