//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. Both infrastructure errors (`AppError`) and fatal
//! submission errors (`SubmissionError`) render through their `ErrorMetadata`, so status, code
//! and log level are decided by the error itself.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use helloworld_core::{AppError, ErrorMetadata, LogLevel, SubmissionError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether the visitor can fix the input and try again
    pub recoverable: bool,
}

/// Wrapper so the external `IntoResponse` trait can be implemented for errors from
/// `helloworld-core`.
#[derive(Debug)]
pub enum HttpAppError {
    App(AppError),
    Submission(SubmissionError),
}

impl HttpAppError {
    fn metadata(&self) -> &dyn ErrorMetadata {
        match self {
            HttpAppError::App(e) => e,
            HttpAppError::Submission(e) => e,
        }
    }

    fn details(&self) -> String {
        match self {
            HttpAppError::App(e) => e.detailed_message(),
            HttpAppError::Submission(SubmissionError::Internal(e)) => e.detailed_message(),
            HttpAppError::Submission(e) => e.to_string(),
        }
    }
}

impl std::fmt::Display for HttpAppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpAppError::App(e) => write!(f, "{}", e),
            HttpAppError::Submission(e) => write!(f, "{}", e),
        }
    }
}

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError::App(err)
    }
}

impl From<SubmissionError> for HttpAppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Internal(inner) => HttpAppError::App(inner),
            other => HttpAppError::Submission(other),
        }
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError::App(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &HttpAppError) {
    let meta = error.metadata();
    let code = meta.error_code();
    match meta.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, code, "Request failed"),
        LogLevel::Warn => tracing::warn!(error = %error, code, "Request failed"),
        LogLevel::Error => tracing::error!(error = %error, code, "Request failed"),
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|env| env.eq_ignore_ascii_case("production") || env.eq_ignore_ascii_case("prod"))
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let meta = self.metadata();
        let status =
            StatusCode::from_u16(meta.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(&self);

        let details = if is_production_env() || meta.is_sensitive() {
            None
        } else {
            Some(self.details())
        };

        let body = ErrorResponse {
            error: meta.client_message(),
            details,
            code: meta.error_code().to_string(),
            recoverable: meta.is_recoverable(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_invalid_is_forbidden() {
        let response = HttpAppError::from(SubmissionError::TokenInvalid).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_submission_error_unwraps_to_app_error() {
        let err = HttpAppError::from(SubmissionError::Internal(AppError::Config(
            "bad form".to_string(),
        )));
        assert!(matches!(err, HttpAppError::App(AppError::Config(_))));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            error: "Not found".to_string(),
            details: None,
            code: "NOT_FOUND".to_string(),
            recoverable: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["recoverable"], false);
        assert!(json.get("details").is_none());
    }
}
