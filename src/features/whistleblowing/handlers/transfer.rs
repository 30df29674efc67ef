//! Multipart upload parsing and download responses

use axum::{
    body::Body,
    extract::Multipart,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::whistleblowing::dtos::{AttachmentDownload, UploadedFile};

/// Read the `file` field of an upload form. Other fields are ignored.
pub(super) async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        if field.name() != Some("file") {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_default();
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "attachment".to_string());

        let bytes = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        upload = Some(UploadedFile {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    upload.ok_or_else(|| AppError::BadRequest("File is required".to_string()))
}

/// Stream attachment bytes back with the stored name and type
pub(super) fn download_response(download: AttachmentDownload) -> Response {
    let content_type = HeaderValue::from_str(&download.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&download.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        Body::from(download.bytes),
    )
        .into_response()
}

fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_is_header_safe() {
        assert_eq!(
            content_disposition("report 2025.pdf"),
            "attachment; filename=\"report 2025.pdf\""
        );
        assert_eq!(
            content_disposition("relatório.pdf"),
            "attachment; filename=\"relat_rio.pdf\""
        );
    }

    #[test]
    fn test_download_headers() {
        let response = download_response(AttachmentDownload {
            filename: "a.txt".to_string(),
            mime_type: "text/plain".to_string(),
            bytes: b"hello".to_vec(),
        });

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"a.txt\""
        );
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
