//! Domain models for the submission flow.

pub mod form_data;
pub mod message;
pub mod outcome;
pub mod principal;
pub mod record;
pub mod submission;

pub use form_data::{FieldValue, FormData};
pub use message::{FlashMessage, MessageKey, MessageLevel};
pub use outcome::SubmissionOutcome;
pub use principal::{Principal, UserProfile};
pub use record::{Greeting, RecordId, SanitizedData, ValidatedRecord};
pub use submission::{
    Attachment, Submission, UploadErrorCode, UploadOutcome, UploadRejection, UploadStage,
};
