//! Best-effort administrator notification after a greeting was saved.

use std::sync::Arc;
use std::time::Duration;

use helloworld_core::constants::ANONYMOUS_SUBMITTER;
use helloworld_core::models::Principal;
use helloworld_core::{ErrorMetadata, Notifier, SubmissionError, UserDirectory};

pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    users: Arc<dyn UserDirectory>,
    /// Configured recipient; `None` or non-positive disables notifications
    recipient_id: Option<i64>,
    timeout: Duration,
}

impl NotificationService {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        users: Arc<dyn UserDirectory>,
        recipient_id: Option<i64>,
        timeout: Duration,
    ) -> Self {
        Self {
            notifier,
            users,
            recipient_id,
            timeout,
        }
    }

    pub fn subject_for(submitter: &Principal) -> String {
        let name = if submitter.is_anonymous() {
            ANONYMOUS_SUBMITTER
        } else {
            submitter.username.as_str()
        };
        format!("New helloworld message added by {}", name)
    }

    pub fn body_for(greeting: &str) -> String {
        format!("New greeting is {}", greeting)
    }

    /// Tell the configured recipient about a new greeting. Never fails; problems are logged.
    ///
    /// Returns whether a message was handed to the transport.
    #[tracing::instrument(skip(self, submitter, greeting), fields(submitter_id = submitter.id))]
    pub async fn notify_new_greeting(&self, submitter: &Principal, greeting: &str) -> bool {
        match self.try_notify(submitter, greeting).await {
            Ok(sent) => sent,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    error_code = err.error_code(),
                    recipient_id = ?self.recipient_id,
                    "Failed to send new greeting notification"
                );
                false
            }
        }
    }

    async fn try_notify(
        &self,
        submitter: &Principal,
        greeting: &str,
    ) -> Result<bool, SubmissionError> {
        let recipient_id = match self.recipient_id {
            Some(id) if id > 0 => id,
            _ => return Ok(false),
        };

        let recipient = self
            .users
            .find_user(recipient_id)
            .await
            .map_err(|e| {
                SubmissionError::NotificationFailed(format!("user lookup failed: {}", e))
            })?
            .ok_or_else(|| {
                SubmissionError::NotificationFailed(format!("user {} not found", recipient_id))
            })?;

        let subject = Self::subject_for(submitter);
        let body = Self::body_for(greeting);

        tokio::time::timeout(
            self.timeout,
            self.notifier.send(&recipient.email, &subject, &body),
        )
        .await
        .map_err(|_| {
            SubmissionError::NotificationFailed(format!(
                "send timed out after {}s",
                self.timeout.as_secs()
            ))
        })?
        .map_err(|e| SubmissionError::NotificationFailed(e.to_string()))?;

        tracing::info!(recipient_id, "New greeting notification sent");
        Ok(true)
    }
}
