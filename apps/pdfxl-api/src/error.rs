//! Error types for the conversion API

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfxl_core::ConvertError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no file")]
    MissingFile,

    #[error("invalid file")]
    InvalidFile,

    #[error("Upload failed: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Conversion(#[from] ConvertError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingFile | ApiError::InvalidFile => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Multipart(e) => (e.status(), e.body_text()),
            ApiError::Conversion(e) => {
                tracing::error!(error = %e, "Conversion failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = Json(ErrorBody {
            error: message,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}
