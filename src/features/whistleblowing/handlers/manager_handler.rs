use axum::{
    extract::{Multipart, Path, Query, State},
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
    AttachmentDto, AuditEntryDto, CaseListQuery, DeleteAttachmentResponseDto,
    ManagerCaseDetailDto, ManagerCaseSummaryDto, MessageDto, PostMessageDto, UpdateCaseDto,
    UploadAttachmentDto,
};
use crate::features::whistleblowing::services::AttachmentViewer;
use crate::shared::types::{ApiResponse, Meta};

use super::transfer::{download_response, read_upload};
use super::WbState;

/// List cases assigned to the case manager
#[utoipa::path(
    get,
    path = "/api/wb/manager/cases",
    params(CaseListQuery),
    responses(
        (status = 200, description = "Cases, most recently updated first", body = ApiResponse<Vec<ManagerCaseSummaryDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not the case manager")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn list_cases(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Query(query): Query<CaseListQuery>,
) -> Result<Json<ApiResponse<Vec<ManagerCaseSummaryDto>>>> {
    let cases = state.cases.list_cases(&user, query).await?;
    let meta = Meta::total(cases.len());
    Ok(Json(ApiResponse::success(Some(cases), None, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/wb/manager/cases/protocol/{code}",
    params(
        ("code" = String, Path, description = "Case protocol code")
    ),
    responses(
        (status = 200, description = "Case found", body = ApiResponse<ManagerCaseSummaryDto>),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn find_case_by_protocol(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<ManagerCaseSummaryDto>>> {
    let case = state.cases.find_by_protocol(&user, &code).await?;
    Ok(Json(ApiResponse::success(Some(case), None, None)))
}

/// Full case view. Each call is recorded in the audit trail.
#[utoipa::path(
    get,
    path = "/api/wb/manager/cases/{id}",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    responses(
        (status = 200, description = "Case detail", body = ApiResponse<ManagerCaseDetailDto>),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn get_case(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ManagerCaseDetailDto>>> {
    let detail = state.cases.get_case_detail(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(detail), None, None)))
}

#[utoipa::path(
    patch,
    path = "/api/wb/manager/cases/{id}",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    request_body = UpdateCaseDto,
    responses(
        (status = 200, description = "Case updated", body = ApiResponse<ManagerCaseSummaryDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn update_case(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCaseDto>,
) -> Result<Json<ApiResponse<ManagerCaseSummaryDto>>> {
    let case = state.cases.update_case(&user, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(case), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/wb/manager/cases/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    request_body = PostMessageDto,
    responses(
        (status = 201, description = "Reply posted", body = ApiResponse<MessageDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn post_manager_message(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<PostMessageDto>,
) -> Result<(StatusCode, Json<ApiResponse<MessageDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let message = state.threads.post_manager_message(&user, id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(message), None, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/wb/manager/cases/{id}/audit",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    responses(
        (status = 200, description = "Audit trail, oldest first", body = ApiResponse<Vec<AuditEntryDto>>),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn list_case_audit(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<AuditEntryDto>>>> {
    let entries = state.cases.list_audit(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(entries), None, None)))
}

/// List every attachment regardless of scan status
#[utoipa::path(
    get,
    path = "/api/wb/manager/cases/{id}/attachments",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    responses(
        (status = 200, description = "Attachments", body = ApiResponse<Vec<AttachmentDto>>),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn list_case_attachments(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<AttachmentDto>>>> {
    let case = state.access.manager_case(&user, id).await?;
    let attachments = state
        .attachments
        .list(&case, AttachmentViewer::Manager)
        .await?;
    Ok(Json(ApiResponse::success(Some(attachments), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/wb/manager/cases/{id}/attachments",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    request_body(content = UploadAttachmentDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Attachment stored and scanned", body = ApiResponse<AttachmentDto>),
        (status = 400, description = "Missing, empty or oversized file"),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn upload_case_attachment(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<AttachmentDto>>)> {
    let case = state.access.manager_case(&user, id).await?;
    let file = read_upload(multipart).await?;

    let attachment = state
        .attachments
        .upload(&case, AttachmentViewer::Manager, file)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(attachment), None, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/wb/manager/cases/{id}/attachments/{attachment_id}",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "File bytes", content_type = "application/octet-stream"),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Attachment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn download_case_attachment(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Response> {
    let case = state.access.manager_case(&user, id).await?;
    let download = state
        .attachments
        .download(&case, AttachmentViewer::Manager, attachment_id)
        .await?;
    Ok(download_response(download))
}

#[utoipa::path(
    post,
    path = "/api/wb/manager/cases/{id}/attachments/{attachment_id}/rescan",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Rescanned", body = ApiResponse<AttachmentDto>),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Attachment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn rescan_case_attachment(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<AttachmentDto>>> {
    let case = state.access.manager_case(&user, id).await?;
    let attachment = state.attachments.rescan(&case, attachment_id).await?;
    Ok(Json(ApiResponse::success(Some(attachment), None, None)))
}

#[utoipa::path(
    delete,
    path = "/api/wb/manager/cases/{id}/attachments/{attachment_id}",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Attachment deleted", body = ApiResponse<DeleteAttachmentResponseDto>),
        (status = 403, description = "Caller is not the case manager"),
        (status = 404, description = "Attachment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "whistleblowing-manager"
)]
pub async fn delete_case_attachment(
    user: AuthenticatedUser,
    State(state): State<WbState>,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<DeleteAttachmentResponseDto>>> {
    let case = state.access.manager_case(&user, id).await?;
    state.attachments.delete(&case, attachment_id).await?;
    Ok(Json(ApiResponse::success(
        Some(DeleteAttachmentResponseDto { deleted: true }),
        Some("Attachment deleted successfully".to_string()),
        None,
    )))
}
