use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::whistleblowing::dtos::{
    AttachmentDto, CreateReportDto, IdentifiedReportCreatedDto, MessageDto, PostMessageDto,
    ReporterCaseDetailDto, ReporterCaseSummaryDto, UploadAttachmentDto,
};
use crate::features::whistleblowing::services::AttachmentViewer;
use crate::shared::types::{ApiResponse, Meta};

use super::transfer::{download_response, read_upload};
use super::WbState;

/// Submit a report under the caller's identity
#[utoipa::path(
    post,
    path = "/api/wb/reports",
    request_body = CreateReportDto,
    responses(
        (status = 201, description = "Report submitted", body = ApiResponse<IdentifiedReportCreatedDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-reporter"
)]
pub async fn create_identified_report(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    AppJson(dto): AppJson<CreateReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<IdentifiedReportCreatedDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = state.intake.create_identified_report(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(created), None, None)),
    ))
}

/// List the caller's own identified reports
#[utoipa::path(
    get,
    path = "/api/wb/reports",
    responses(
        (status = 200, description = "Own reports", body = ApiResponse<Vec<ReporterCaseSummaryDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-reporter"
)]
pub async fn list_my_reports(
    user: AuthenticatedUser,
    State(state): State<WbState>,
) -> Result<Json<ApiResponse<Vec<ReporterCaseSummaryDto>>>> {
    let reports = state.threads.list_reporter_cases(&user).await?;
    let meta = Meta::total(reports.len());
    Ok(Json(ApiResponse::success(Some(reports), None, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/wb/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report with thread", body = ApiResponse<ReporterCaseDetailDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-reporter"
)]
pub async fn get_my_report(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReporterCaseDetailDto>>> {
    let report = state.threads.get_reporter_case(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/wb/reports/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = PostMessageDto,
    responses(
        (status = 201, description = "Message posted", body = ApiResponse<MessageDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-reporter"
)]
pub async fn post_my_message(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<PostMessageDto>,
) -> Result<(StatusCode, Json<ApiResponse<MessageDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let message = state.threads.post_reporter_message(&user, id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(message), None, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/wb/reports/{id}/attachments",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Clean attachments", body = ApiResponse<Vec<AttachmentDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-reporter"
)]
pub async fn list_my_attachments(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<AttachmentDto>>>> {
    let case = state.access.reporter_case(&user, id).await?;
    let attachments = state
        .attachments
        .list(&case, AttachmentViewer::Reporter)
        .await?;
    Ok(Json(ApiResponse::success(Some(attachments), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/wb/reports/{id}/attachments",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body(content = UploadAttachmentDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Attachment stored and scanned", body = ApiResponse<AttachmentDto>),
        (status = 400, description = "Missing, empty or oversized file"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-reporter"
)]
pub async fn upload_my_attachment(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<AttachmentDto>>)> {
    let case = state.access.reporter_case(&user, id).await?;
    let file = read_upload(multipart).await?;

    let attachment = state
        .attachments
        .upload(&case, AttachmentViewer::Reporter, file)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(attachment), None, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/wb/reports/{id}/attachments/{attachment_id}",
    params(
        ("id" = Uuid, Path, description = "Report ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "File bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Attachment has not passed the virus scan"),
        (status = 404, description = "Attachment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-reporter"
)]
pub async fn download_my_attachment(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Response> {
    let case = state.access.reporter_case(&user, id).await?;
    let download = state
        .attachments
        .download(&case, AttachmentViewer::Reporter, attachment_id)
        .await?;
    Ok(download_response(download))
}
