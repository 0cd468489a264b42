//! Error types module
//!
//! `AppError` covers infrastructure failures (database, storage, configuration) shared by
//! every crate. `SubmissionError` is the taxonomy of ways a single form submission can end
//! short of success; the processor decides which of them are fatal and which are rendered
//! back to the visitor as a redirect with a message.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

use crate::models::UploadErrorCode;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DATABASE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the visitor can correct the input and resubmit
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mail delivery error: {0}")]
    Mail(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, true, LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, true, LogLevel::Error),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", true, false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        AppError::Config(_) => (500, "CONFIGURATION_ERROR", false, true, LogLevel::Error),
        AppError::Mail(_) => (502, "MAIL_ERROR", true, true, LogLevel::Error),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, true, LogLevel::Error)
        }
    }
}

impl AppError {
    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Config(_) => "Service misconfigured".to_string(),
            AppError::Mail(_) => "Failed to send notification".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

/// Every way a submission can stop short of a clean save.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("You are not permitted to use that link to directly access that page")]
    AuthorizationDenied,

    #[error("The most recent request was denied because it had an invalid security token")]
    TokenInvalid,

    #[error("Form validation failed with {count} error(s)")]
    ValidationFailed { count: usize },

    #[error("File upload error, code {0}")]
    FileUploadError(UploadErrorCode),

    #[error("Filename is invalid after cleaning")]
    FilenameInvalid,

    #[error("Upload rejected by media policy: {0}")]
    MediaPolicyRejected(String),

    #[error("A file already exists at {0}")]
    FileAlreadyExists(String),

    #[error("Unable to store uploaded file: {0}")]
    FileStoreWriteFailed(String),

    #[error("Save failed: {0}")]
    PersistenceFailed(String),

    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl SubmissionError {
    /// Errors that abort the request outright instead of bouncing the visitor back to the form.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SubmissionError::AuthorizationDenied
                | SubmissionError::TokenInvalid
                | SubmissionError::Internal(_)
        )
    }
}

impl ErrorMetadata for SubmissionError {
    fn http_status_code(&self) -> u16 {
        match self {
            SubmissionError::AuthorizationDenied | SubmissionError::TokenInvalid => 403,
            SubmissionError::Internal(inner) => inner.http_status_code(),
            // Recoverable outcomes are rendered as a redirect back to the form.
            _ => 303,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SubmissionError::AuthorizationDenied => "AUTHORIZATION_DENIED",
            SubmissionError::TokenInvalid => "TOKEN_INVALID",
            SubmissionError::ValidationFailed { .. } => "VALIDATION_FAILED",
            SubmissionError::FileUploadError(_) => "FILE_UPLOAD_ERROR",
            SubmissionError::FilenameInvalid => "FILENAME_INVALID",
            SubmissionError::MediaPolicyRejected(_) => "MEDIA_POLICY_REJECTED",
            SubmissionError::FileAlreadyExists(_) => "FILE_ALREADY_EXISTS",
            SubmissionError::FileStoreWriteFailed(_) => "FILE_STORE_WRITE_FAILED",
            SubmissionError::PersistenceFailed(_) => "PERSISTENCE_FAILED",
            SubmissionError::NotificationFailed(_) => "NOTIFICATION_FAILED",
            SubmissionError::Internal(inner) => inner.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    fn client_message(&self) -> String {
        match self {
            SubmissionError::Internal(inner) => inner.client_message(),
            other => other.to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        match self {
            SubmissionError::Internal(inner) => inner.is_sensitive(),
            _ => false,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            SubmissionError::ValidationFailed { .. }
            | SubmissionError::FilenameInvalid
            | SubmissionError::MediaPolicyRejected(_)
            | SubmissionError::FileAlreadyExists(_) => LogLevel::Debug,
            SubmissionError::AuthorizationDenied
            | SubmissionError::TokenInvalid
            | SubmissionError::FileUploadError(_)
            | SubmissionError::PersistenceFailed(_) => LogLevel::Warn,
            SubmissionError::FileStoreWriteFailed(_) | SubmissionError::NotificationFailed(_) => {
                LogLevel::Error
            }
            SubmissionError::Internal(inner) => inner.log_level(),
        }
    }
}
