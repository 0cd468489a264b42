//! Helloworld Services Library
//!
//! Orchestration of a greeting submission (`SubmissionProcessor`) and the collaborators it
//! is wired with: the upload pipeline, CSRF tokens, notifications, SMTP delivery and the
//! in-memory stores used when no database is configured.

pub mod authorization;
pub mod email;
pub mod memory;
pub mod notification;
pub mod processor;
pub mod session;
pub mod token;
pub mod upload;

pub use authorization::StaticAuthorization;
pub use email::EmailService;
pub use memory::{MemoryRecordStore, MemoryUserDirectory};
pub use notification::NotificationService;
pub use processor::{SubmissionProcessor, SubmissionRequest};
pub use session::{FlashMessages, MemorySessionStore};
pub use token::{CsrfTokenService, TokenService};
pub use upload::UploadPipeline;
