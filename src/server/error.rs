use crate::pipeline::PhaseError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,

    #[error("File validation failed")]
    Validation(Vec<String>),

    #[error("Failed to extract ZIP file: {0}")]
    Extraction(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Project must be analyzed first")]
    NotAnalyzed,

    #[error("{error}")]
    SetupFailed { error: String, details: Vec<String> },

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error("{message}: {cause}")]
    Internal { message: &'static str, cause: String },
}

impl ApiError {
    pub fn internal(message: &'static str, cause: impl ToString) -> Self {
        ApiError::Internal {
            message,
            cause: cause.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFile | ApiError::Validation(_) | ApiError::NotAnalyzed => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Multipart(e) => e.status(),
            ApiError::Extraction(_) | ApiError::SetupFailed { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Maps a phase failure, using `context` as the message for unexpected faults.
pub fn phase_error(context: &'static str, error: PhaseError) -> ApiError {
    match error {
        PhaseError::ProjectNotFound(_) => ApiError::NotFound("Project not found"),
        PhaseError::NotAnalyzed => ApiError::NotAnalyzed,
        PhaseError::StepFailed { .. } => ApiError::SetupFailed {
            error: error.to_string(),
            details: error.details(),
        },
        PhaseError::Extraction { source, .. } => ApiError::Extraction(source.to_string()),
        other => ApiError::internal(context, other),
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

impl ErrorBody {
    fn plain(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            details: None,
            timestamp: None,
        }
    }

    fn coded(error: &str, code: &'static str, details: Option<serde_json::Value>) -> Self {
        Self {
            error: error.to_string(),
            code: Some(code),
            details,
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::NoFile => ErrorBody::coded("No file uploaded", "NO_FILE", None),
            ApiError::Validation(errors) => ErrorBody::coded(
                "File validation failed",
                "VALIDATION_FAILED",
                Some(serde_json::json!(errors)),
            ),
            ApiError::Extraction(cause) => ErrorBody::coded(
                "Failed to extract ZIP file",
                "EXTRACTION_FAILED",
                Some(serde_json::json!(cause)),
            ),
            ApiError::NotFound(message) => ErrorBody::plain(*message),
            ApiError::NotAnalyzed => ErrorBody::plain(self.to_string()),
            ApiError::SetupFailed { error, details } => ErrorBody {
                details: Some(serde_json::json!(details)),
                ..ErrorBody::plain(error.clone())
            },
            ApiError::Multipart(e) => ErrorBody::plain(e.body_text()),
            ApiError::Internal { message, cause } => {
                tracing::error!(
                    error = %cause,
                    http_status = %status,
                    "Request failed"
                );
                ErrorBody::plain(*message)
            }
        };

        (status, Json(body)).into_response()
    }
}
