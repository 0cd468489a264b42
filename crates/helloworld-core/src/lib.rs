//! Helloworld Core Library
//!
//! Domain models, error types, configuration and the collaborator traits shared by every
//! crate of the greeting submission service.

pub mod config;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod models;

// Re-export commonly used types
pub use config::{HelloworldConfig, SmtpConfig};
pub use error::{AppError, ErrorMetadata, LogLevel, SubmissionError};
pub use hooks::{
    AuthorizationService, NoOpNotifier, Notifier, RecordStore, SessionState, UserDirectory,
};
