use super::{FlashMessage, RecordId};
use crate::error::SubmissionError;

/// What the caller should do after a submission was processed.
///
/// The HTTP layer decides how to render each variant; the processor never writes a response.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Record stored; redirect back with the success message.
    Saved {
        redirect: String,
        record_id: RecordId,
        image_path: Option<String>,
        message: FlashMessage,
    },
    /// Principal may not create greetings.
    Forbidden { message: FlashMessage },
    /// Form fields failed validation; at most three messages are surfaced.
    ValidationRejected {
        redirect: String,
        messages: Vec<FlashMessage>,
        error_count: usize,
    },
    /// Upload or persistence failed; nothing was saved.
    Rejected {
        redirect: String,
        error: SubmissionError,
        message: Option<FlashMessage>,
    },
    /// Visitor abandoned the form.
    Cancelled {
        redirect: String,
        message: FlashMessage,
    },
}

impl SubmissionOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SubmissionOutcome::Saved { .. })
    }

    /// HTTP-equivalent status: 403 for a denied principal, 303 for every redirect.
    pub fn status_code(&self) -> u16 {
        match self {
            SubmissionOutcome::Forbidden { .. } => 403,
            _ => 303,
        }
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        match self {
            SubmissionOutcome::Saved { redirect, .. }
            | SubmissionOutcome::ValidationRejected { redirect, .. }
            | SubmissionOutcome::Rejected { redirect, .. }
            | SubmissionOutcome::Cancelled { redirect, .. } => Some(redirect),
            SubmissionOutcome::Forbidden { .. } => None,
        }
    }

    pub fn messages(&self) -> Vec<&FlashMessage> {
        match self {
            SubmissionOutcome::Saved { message, .. }
            | SubmissionOutcome::Forbidden { message }
            | SubmissionOutcome::Cancelled { message, .. } => vec![message],
            SubmissionOutcome::ValidationRejected { messages, .. } => messages.iter().collect(),
            SubmissionOutcome::Rejected { message, .. } => message.iter().collect(),
        }
    }

    /// The error behind a rejection, if any.
    pub fn error(&self) -> Option<&SubmissionError> {
        match self {
            SubmissionOutcome::Rejected { error, .. } => Some(error),
            _ => None,
        }
    }
}
