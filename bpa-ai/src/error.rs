//! Error types for bpa-ai
//!
//! `AnalysisError` is what the pipeline reports to its caller; `ApiError` maps
//! it (and everything else a handler can hit) onto an HTTP response. Upstream
//! payloads never reach a response body: rejected calls surface as a generic
//! message plus a correlation id that can be matched against the logs.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{CompletionError, ExtractionError};

/// Non-recoverable pipeline failure
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Missing credential or other setup problem; fatal, never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The completion service refused the request
    #[error("Upstream service rejected the request (correlation id {correlation_id})")]
    UpstreamRejected { correlation_id: Uuid },

    #[error("No answers supplied")]
    NoAnswers,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AnalysisError {
    /// Surface a completion failure that must reach the caller
    ///
    /// `Unavailable` is recoverable and yields `None`. A rejection is logged
    /// with its detail under a fresh correlation id; only the id travels on.
    pub fn from_completion(err: &CompletionError, operation: &str) -> Option<Self> {
        match err {
            CompletionError::Unavailable(_) => None,
            CompletionError::MissingCredential => Some(AnalysisError::Configuration(
                "Completion service credential is not configured".to_string(),
            )),
            CompletionError::Rejected(detail) => {
                let correlation_id = Uuid::new_v4();
                tracing::error!(
                    %correlation_id,
                    operation,
                    detail = %detail,
                    "Completion service rejected request"
                );
                Some(AnalysisError::UpstreamRejected { correlation_id })
            }
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Required setting or credential missing (503)
    #[error("Service not configured: {0}")]
    Configuration(String),

    /// External service refused the request (502)
    #[error("Upstream rejected request {correlation_id}")]
    UpstreamRejected { correlation_id: Uuid },

    /// External site or service could not be reached (502)
    #[error("Upstream failure: {0}")]
    BadGateway(String),

    /// Storage or other internal failure (500); detail is logged, not returned
    #[error("Internal error: {0}")]
    Common(#[from] bpa_common::Error),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Configuration(msg) => ApiError::Configuration(msg),
            AnalysisError::UpstreamRejected { correlation_id } => {
                ApiError::UpstreamRejected { correlation_id }
            }
            AnalysisError::NoAnswers => {
                ApiError::BadRequest("At least one answer is required".to_string())
            }
            AnalysisError::InvalidRequest(msg) => ApiError::BadRequest(msg),
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::InvalidUrl(msg) => {
                ApiError::BadRequest(format!("Invalid URL: {}", msg))
            }
            ExtractionError::NavigationFailed(_) => {
                ApiError::BadGateway("The website could not be loaded".to_string())
            }
            ExtractionError::Browser(_) => {
                ApiError::BadGateway("The website could not be rendered".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut correlation = None;
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Configuration(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CONFIGURATION_ERROR",
                msg,
            ),
            ApiError::UpstreamRejected { correlation_id } => {
                correlation = Some(correlation_id);
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_REJECTED",
                    "The analysis service could not process this request. Please try again later."
                        .to_string(),
                )
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", msg),
            ApiError::Common(err) => {
                let correlation_id = Uuid::new_v4();
                tracing::error!(
                    %correlation_id,
                    error = %err,
                    "Request failed with internal error"
                );
                correlation = Some(correlation_id);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred. Please try again later.".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let Some(id) = correlation {
            error["correlation_id"] = json!(id.to_string());
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
