//! API error taxonomy with stable error codes.
//!
//! Every failure crosses the transport boundary as
//! `{success: false, message, error_code}` with a status reflecting the
//! failure class: 400 for client-side validation, 409 for duplicate
//! filenames, 500 for server/storage/service failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::gemini::GeminiError;
use crate::pdftext::PdfTextError;
use crate::store::StoreError;
use crate::upload::UploadError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,
    #[error("no file uploaded")]
    MissingFile,
    #[error("invalid file name format, please use YYYY.MM.pdf")]
    InvalidFilename,
    #[error("uploaded file must be a PDF")]
    UnsupportedMediaType,
    #[error("file already exists, please rename the file and try again")]
    DuplicateFile,
    #[error("menu item not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("the generative service API key is not configured")]
    ServiceUnconfigured,
    #[error(transparent)]
    Extraction(#[from] PdfTextError),
    #[error(transparent)]
    Service(#[from] GeminiError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("failed to store uploaded file: {0}")]
    UploadIo(std::io::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "auth_required"),
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "missing_file"),
            ApiError::InvalidFilename => (StatusCode::BAD_REQUEST, "invalid_filename"),
            ApiError::UnsupportedMediaType => (StatusCode::BAD_REQUEST, "unsupported_media_type"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::DuplicateFile => (StatusCode::CONFLICT, "duplicate_file"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::ServiceUnconfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, "service_not_configured")
            }
            ApiError::Extraction(PdfTextError::Unavailable) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "extraction_unavailable")
            }
            ApiError::Extraction(PdfTextError::Failed(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "extraction_failed")
            }
            ApiError::Service(GeminiError::Transport(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "service_transport_error")
            }
            ApiError::Service(GeminiError::Service { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "service_error")
            }
            ApiError::Service(GeminiError::MalformedResponse(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "service_malformed_response",
            ),
            ApiError::Storage(_) | ApiError::UploadIo(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::InvalidFilename => ApiError::InvalidFilename,
            UploadError::Duplicate => ApiError::DuplicateFile,
            UploadError::Io(io) => ApiError::UploadIo(io),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!("{}: {}", code, self);
        }
        let body = json!({
            "success": false,
            "message": self.to_string(),
            "error_code": code,
        });
        (status, Json(body)).into_response()
    }
}
