use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::whistleblowing::{
    dtos as wb_dtos, handlers as wb_handlers, models as wb_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handler::get_me,
        // Categories (public)
        categories_handlers::list_categories,
        // Whistleblowing: anonymous reporter
        wb_handlers::create_anonymous_report,
        wb_handlers::get_anonymous_thread,
        wb_handlers::post_anonymous_message,
        wb_handlers::list_anonymous_attachments,
        wb_handlers::upload_anonymous_attachment,
        wb_handlers::download_anonymous_attachment,
        // Whistleblowing: identified reporter
        wb_handlers::create_identified_report,
        wb_handlers::list_my_reports,
        wb_handlers::get_my_report,
        wb_handlers::post_my_message,
        wb_handlers::list_my_attachments,
        wb_handlers::upload_my_attachment,
        wb_handlers::download_my_attachment,
        // Whistleblowing: case manager
        wb_handlers::list_cases,
        wb_handlers::find_case_by_protocol,
        wb_handlers::get_case,
        wb_handlers::update_case,
        wb_handlers::post_manager_message,
        wb_handlers::list_case_audit,
        wb_handlers::list_case_attachments,
        wb_handlers::upload_case_attachment,
        wb_handlers::download_case_attachment,
        wb_handlers::rescan_case_attachment,
        wb_handlers::delete_case_attachment,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::dto::MeResponseDto,
            ApiResponse<auth::dto::MeResponseDto>,
            // Categories
            categories_dtos::ReportCategoryDto,
            ApiResponse<Vec<categories_dtos::ReportCategoryDto>>,
            // Whistleblowing
            wb_models::CaseStatus,
            wb_models::SenderRole,
            wb_models::AvStatus,
            wb_models::ActorRole,
            wb_dtos::CreateReportDto,
            wb_dtos::AnonymousReportCreatedDto,
            wb_dtos::IdentifiedReportCreatedDto,
            wb_dtos::PostMessageDto,
            wb_dtos::MessageDto,
            wb_dtos::AnonymousThreadDto,
            wb_dtos::ReporterCaseSummaryDto,
            wb_dtos::ReporterCaseDetailDto,
            wb_dtos::UploadAttachmentDto,
            wb_dtos::AttachmentDto,
            wb_dtos::DeleteAttachmentResponseDto,
            wb_dtos::ManagerCaseSummaryDto,
            wb_dtos::ManagerCaseDetailDto,
            wb_dtos::ReporterIdentityDto,
            wb_dtos::UpdateCaseDto,
            wb_dtos::AuditEntryDto,
            ApiResponse<wb_dtos::AnonymousReportCreatedDto>,
            ApiResponse<wb_dtos::IdentifiedReportCreatedDto>,
            ApiResponse<wb_dtos::AnonymousThreadDto>,
            ApiResponse<wb_dtos::MessageDto>,
            ApiResponse<Vec<wb_dtos::ReporterCaseSummaryDto>>,
            ApiResponse<wb_dtos::ReporterCaseDetailDto>,
            ApiResponse<wb_dtos::AttachmentDto>,
            ApiResponse<Vec<wb_dtos::AttachmentDto>>,
            ApiResponse<wb_dtos::DeleteAttachmentResponseDto>,
            ApiResponse<Vec<wb_dtos::ManagerCaseSummaryDto>>,
            ApiResponse<wb_dtos::ManagerCaseSummaryDto>,
            ApiResponse<wb_dtos::ManagerCaseDetailDto>,
            ApiResponse<Vec<wb_dtos::AuditEntryDto>>,
        )
    ),
    tags(
        (name = "auth", description = "Current actor identity"),
        (name = "categories", description = "Report categories (public)"),
        (name = "whistleblowing-anonymous", description = "Anonymous reporting, authenticated by protocol code and reply token"),
        (name = "whistleblowing-reporter", description = "Identified reporting for signed-in employees"),
        (name = "whistleblowing-manager", description = "Case handling (case manager role only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Whistleblowing Intake API",
        version = "0.1.0",
        description = "Confidential report intake and case handling",
    )
)]
pub struct ApiDoc;

/// Adds the Bearer JWT security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_whistleblowing_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/wb/anonymous/reports",
            "/api/wb/anonymous/{protocol}/thread",
            "/api/wb/reports/{id}/attachments/{attachment_id}",
            "/api/wb/manager/cases/{id}/attachments/{attachment_id}/rescan",
            "/api/wb/manager/cases/{id}/audit",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
