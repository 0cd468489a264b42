//! Submission processor
//!
//! Runs one "add greeting" submission end to end: authorization, token check, form
//! validation, upload, persistence, reindex and notification. The result is a
//! `SubmissionOutcome` describing what the caller should render; the processor never
//! touches a response itself.

use std::sync::Arc;

use helloworld_core::constants::{
    edit_data_key, COMPONENT, CREATE_ACTION, EDIT_CONTEXT, MAX_VALIDATION_MESSAGES,
};
use helloworld_core::models::{
    FlashMessage, FormData, MessageKey, MessageLevel, Principal, Submission, SubmissionOutcome,
    UploadOutcome, UploadRejection, ValidatedRecord,
};
use helloworld_core::{AppError, AuthorizationService, RecordStore, SessionState, SubmissionError};
use helloworld_processing::FormSchema;

use crate::notification::NotificationService;
use crate::token::TokenService;
use crate::upload::UploadPipeline;

/// Form field holding the greeting text
pub const GREETING_FIELD: &str = "greeting";

/// Key under which a stored image path is kept in stashed form data
pub const IMAGE_FIELD: &str = "image";

/// One inbound submission
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub submission: Submission,
    /// CSRF token presented with the request
    pub token: Option<String>,
    /// Where the form was posted from; every redirect goes back there
    pub return_uri: String,
}

pub struct SubmissionProcessor {
    authorization: Arc<dyn AuthorizationService>,
    schema: Arc<FormSchema>,
    records: Arc<dyn RecordStore>,
    uploads: UploadPipeline,
    notifications: NotificationService,
    session: Arc<dyn SessionState>,
    tokens: Arc<dyn TokenService>,
    edit_key: String,
}

impl SubmissionProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        authorization: Arc<dyn AuthorizationService>,
        schema: Arc<FormSchema>,
        records: Arc<dyn RecordStore>,
        uploads: UploadPipeline,
        notifications: NotificationService,
        session: Arc<dyn SessionState>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            authorization,
            schema,
            records,
            uploads,
            notifications,
            session,
            tokens,
            edit_key: edit_data_key(COMPONENT, EDIT_CONTEXT),
        }
    }

    /// Session key holding rejected form data
    pub fn edit_key(&self) -> &str {
        &self.edit_key
    }

    /// Process one submission.
    ///
    /// `Err` is returned only for fatal conditions (invalid token, infrastructure failure
    /// before the save). Every recoverable failure is an `Ok` outcome carrying a redirect.
    #[tracing::instrument(
        skip(self, principal, request),
        fields(principal_id = principal.id, session_id = %principal.session_id)
    )]
    pub async fn handle(
        &self,
        principal: &Principal,
        request: SubmissionRequest,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let SubmissionRequest {
            mut submission,
            token,
            return_uri,
        } = request;

        if !self
            .authorization
            .authorize(principal, CREATE_ACTION, COMPONENT)
            .await
        {
            tracing::warn!("Submission denied: principal may not create greetings");
            return Ok(SubmissionOutcome::Forbidden {
                message: FlashMessage::from_key(MessageLevel::Error, MessageKey::AlertNoAuthor, &[]),
            });
        }

        let token_valid = token
            .as_deref()
            .is_some_and(|t| self.tokens.verify_and_consume(&principal.session_id, t));
        if !token_valid {
            tracing::warn!("Submission rejected: invalid security token");
            return Err(SubmissionError::TokenInvalid);
        }

        let sanitized = match self.schema.validate(&submission.fields) {
            Ok(sanitized) => sanitized,
            Err(errors) => {
                let error_count = errors.len();
                tracing::debug!(error_count, "Form validation failed");

                self.stash(principal, &submission.fields).await?;

                let messages = errors
                    .into_iter()
                    .take(MAX_VALIDATION_MESSAGES)
                    .map(|e| FlashMessage::text(MessageLevel::Warning, e.message))
                    .collect();

                return Ok(SubmissionOutcome::ValidationRejected {
                    redirect: return_uri,
                    messages,
                    error_count,
                });
            }
        };
        submission.validated = true;

        let image_path = match self.uploads.process(submission.attachment.as_ref()).await {
            UploadOutcome::NoFileProvided => None,
            UploadOutcome::Stored(path) => Some(path),
            UploadOutcome::Rejected(rejection) => {
                return Ok(upload_rejected(rejection, return_uri));
            }
        };

        let record = ValidatedRecord {
            greeting: sanitized.text(GREETING_FIELD).unwrap_or_default().to_string(),
            image_path,
            created_by: principal.id.max(0),
        };

        let record_id = match self.records.save(&record).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(error = %err.detailed_message(), "Failed to save greeting");

                let mut retry = sanitized.as_form_data().clone();
                if let Some(path) = &record.image_path {
                    retry.insert(IMAGE_FIELD, path.as_str());
                }
                self.stash(principal, &retry).await?;

                let reason = err.to_string();
                return Ok(SubmissionOutcome::Rejected {
                    redirect: return_uri,
                    message: Some(FlashMessage::from_key(
                        MessageLevel::Warning,
                        MessageKey::SaveFailed,
                        &[&reason],
                    )),
                    error: SubmissionError::PersistenceFailed(reason),
                });
            }
        };

        // The record is durable from here on; nothing below may fail the submission.
        if let Err(e) = self
            .session
            .clear(&principal.session_id, &self.edit_key)
            .await
        {
            tracing::warn!(error = %e, "Failed to clear stashed form data");
        }

        if let Err(e) = self.records.reindex(record_id).await {
            tracing::warn!(record_id, error = %e, "Reindex after save failed");
        }

        self.notifications
            .notify_new_greeting(principal, &record.greeting)
            .await;

        tracing::info!(record_id, image_path = ?record.image_path, "Greeting added");

        Ok(SubmissionOutcome::Saved {
            redirect: return_uri,
            record_id,
            image_path: record.image_path,
            message: FlashMessage::from_key(MessageLevel::Message, MessageKey::AddSuccessful, &[]),
        })
    }

    /// Abandon the form: forget stashed data and send the visitor back.
    #[tracing::instrument(skip(self, principal), fields(principal_id = principal.id))]
    pub async fn cancel(
        &self,
        principal: &Principal,
        return_uri: impl Into<String> + std::fmt::Debug,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.session
            .clear(&principal.session_id, &self.edit_key)
            .await?;

        Ok(SubmissionOutcome::Cancelled {
            redirect: return_uri.into(),
            message: FlashMessage::from_key(MessageLevel::Message, MessageKey::AddCancelled, &[]),
        })
    }

    /// Data of the last rejected submission, for pre-filling the form. Read once.
    pub async fn load_form_data(
        &self,
        principal: &Principal,
    ) -> Result<Option<FormData>, SubmissionError> {
        let stashed = self
            .session
            .take(&principal.session_id, &self.edit_key)
            .await?;

        stashed
            .map(|value| serde_json::from_value(value).map_err(AppError::from))
            .transpose()
            .map_err(SubmissionError::from)
    }

    /// Mint a token for the principal's next submission.
    pub fn issue_token(&self, principal: &Principal) -> Result<String, SubmissionError> {
        Ok(self.tokens.issue(&principal.session_id)?)
    }

    async fn stash(&self, principal: &Principal, data: &FormData) -> Result<(), SubmissionError> {
        let value = serde_json::to_value(data).map_err(AppError::from)?;
        self.session
            .set(&principal.session_id, &self.edit_key, value)
            .await?;
        Ok(())
    }
}

fn upload_rejected(rejection: UploadRejection, redirect: String) -> SubmissionOutcome {
    let (error, message) = match rejection {
        UploadRejection::UploadError(code) => (
            SubmissionError::FileUploadError(code),
            FlashMessage::from_key(
                MessageLevel::Warning,
                MessageKey::ErrorFileUpload,
                &[&code.to_string()],
            ),
        ),
        UploadRejection::FilenameInvalid => (
            SubmissionError::FilenameInvalid,
            FlashMessage::from_key(MessageLevel::Warning, MessageKey::ErrorBadFilename, &[]),
        ),
        UploadRejection::MediaPolicy(reason) => (
            SubmissionError::MediaPolicyRejected(reason.clone()),
            FlashMessage::text(MessageLevel::Error, reason),
        ),
        UploadRejection::FileExists(path) => (
            SubmissionError::FileAlreadyExists(path),
            FlashMessage::from_key(MessageLevel::Warning, MessageKey::ErrorFileExists, &[]),
        ),
        UploadRejection::StoreFailed(reason) => (
            SubmissionError::FileStoreWriteFailed(reason),
            FlashMessage::from_key(
                MessageLevel::Warning,
                MessageKey::ErrorUnableToUploadFile,
                &[],
            ),
        ),
    };

    SubmissionOutcome::Rejected {
        redirect,
        error,
        message: Some(message),
    }
}
