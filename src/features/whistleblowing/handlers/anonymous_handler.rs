use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientIp, ReplyToken};
use crate::features::rate_limits::RateLimitScope;
use crate::features::whistleblowing::dtos::{
    AnonymousReportCreatedDto, AnonymousThreadDto, AttachmentDto, CreateReportDto, MessageDto,
    PostMessageDto, UploadAttachmentDto,
};
use crate::features::whistleblowing::services::AttachmentViewer;
use crate::shared::types::ApiResponse;

use super::transfer::{download_response, read_upload};
use super::WbState;

/// Submit an anonymous report
///
/// The reply token in the response is shown once and cannot be recovered.
#[utoipa::path(
    post,
    path = "/api/wb/anonymous/reports",
    request_body = CreateReportDto,
    responses(
        (status = 201, description = "Report submitted", body = ApiResponse<AnonymousReportCreatedDto>),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Too many reports from this address")
    ),
    tag = "whistleblowing-anonymous"
)]
pub async fn create_anonymous_report(
    ClientIp(ip): ClientIp,
    State(state): State<WbState>,
    AppJson(dto): AppJson<CreateReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<AnonymousReportCreatedDto>>)> {
    state.rate_limits.check(RateLimitScope::ReportCreation, &ip)?;
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = state.intake.create_anonymous_report(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(created),
            Some("Store the protocol code and reply token; they cannot be recovered".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/wb/anonymous/{protocol}/thread",
    params(
        ("protocol" = String, Path, description = "Case protocol code"),
        ("x-reply-token" = String, Header, description = "Reply token issued at submission")
    ),
    responses(
        (status = 200, description = "Case thread", body = ApiResponse<AnonymousThreadDto>),
        (status = 401, description = "Invalid protocol or reply token")
    ),
    tag = "whistleblowing-anonymous"
)]
pub async fn get_anonymous_thread(
    State(state): State<WbState>,
    Path(protocol): Path<String>,
    ReplyToken(token): ReplyToken,
) -> Result<Json<ApiResponse<AnonymousThreadDto>>> {
    let thread = state.threads.get_anonymous_thread(&protocol, &token).await?;
    Ok(Json(ApiResponse::success(Some(thread), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/wb/anonymous/{protocol}/messages",
    params(
        ("protocol" = String, Path, description = "Case protocol code"),
        ("x-reply-token" = String, Header, description = "Reply token issued at submission")
    ),
    request_body = PostMessageDto,
    responses(
        (status = 201, description = "Message posted", body = ApiResponse<MessageDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid protocol or reply token"),
        (status = 429, description = "Too many requests from this address")
    ),
    tag = "whistleblowing-anonymous"
)]
pub async fn post_anonymous_message(
    ClientIp(ip): ClientIp,
    State(state): State<WbState>,
    Path(protocol): Path<String>,
    ReplyToken(token): ReplyToken,
    AppJson(dto): AppJson<PostMessageDto>,
) -> Result<(StatusCode, Json<ApiResponse<MessageDto>>)> {
    state.rate_limits.check(RateLimitScope::AnonymousThread, &ip)?;
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let message = state
        .threads
        .post_anonymous_message(&protocol, &token, dto)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(message), None, None)),
    ))
}

/// List attachments that passed the virus scan
#[utoipa::path(
    get,
    path = "/api/wb/anonymous/{protocol}/attachments",
    params(
        ("protocol" = String, Path, description = "Case protocol code"),
        ("x-reply-token" = String, Header, description = "Reply token issued at submission")
    ),
    responses(
        (status = 200, description = "Clean attachments", body = ApiResponse<Vec<AttachmentDto>>),
        (status = 401, description = "Invalid protocol or reply token")
    ),
    tag = "whistleblowing-anonymous"
)]
pub async fn list_anonymous_attachments(
    State(state): State<WbState>,
    Path(protocol): Path<String>,
    ReplyToken(token): ReplyToken,
) -> Result<Json<ApiResponse<Vec<AttachmentDto>>>> {
    let case = state.access.anonymous_case(&protocol, &token).await?;
    let attachments = state
        .attachments
        .list(&case, AttachmentViewer::Reporter)
        .await?;
    Ok(Json(ApiResponse::success(Some(attachments), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/wb/anonymous/{protocol}/attachments",
    params(
        ("protocol" = String, Path, description = "Case protocol code"),
        ("x-reply-token" = String, Header, description = "Reply token issued at submission")
    ),
    request_body(content = UploadAttachmentDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Attachment stored and scanned", body = ApiResponse<AttachmentDto>),
        (status = 400, description = "Missing, empty or oversized file"),
        (status = 401, description = "Invalid protocol or reply token"),
        (status = 429, description = "Too many requests from this address")
    ),
    tag = "whistleblowing-anonymous"
)]
pub async fn upload_anonymous_attachment(
    ClientIp(ip): ClientIp,
    State(state): State<WbState>,
    Path(protocol): Path<String>,
    ReplyToken(token): ReplyToken,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<AttachmentDto>>)> {
    state.rate_limits.check(RateLimitScope::AnonymousThread, &ip)?;
    let case = state.access.anonymous_case(&protocol, &token).await?;
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
    path = "/api/wb/anonymous/{protocol}/attachments/{id}",
    params(
        ("protocol" = String, Path, description = "Case protocol code"),
        ("id" = Uuid, Path, description = "Attachment ID"),
        ("x-reply-token" = String, Header, description = "Reply token issued at submission")
    ),
    responses(
        (status = 200, description = "File bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Invalid protocol or reply token"),
        (status = 403, description = "Attachment has not passed the virus scan"),
        (status = 404, description = "Attachment not found")
    ),
    tag = "whistleblowing-anonymous"
)]
pub async fn download_anonymous_attachment(
    State(state): State<WbState>,
    Path((protocol, id)): Path<(String, Uuid)>,
    ReplyToken(token): ReplyToken,
) -> Result<Response> {
    let case = state.access.anonymous_case(&protocol, &token).await?;
    let download = state
        .attachments
        .download(&case, AttachmentViewer::Reporter, id)
        .await?;
    Ok(download_response(download))
}
