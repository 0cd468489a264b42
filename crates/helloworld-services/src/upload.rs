//! Upload pipeline
//!
//! Takes the raw attachment of a submission through
//! `HasFile -> NameSanitized -> MediaPolicyChecked -> PathResolved -> Uploaded`.
//! Any stage can stop with a rejection; the caller aborts the whole submission then.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use helloworld_core::models::{Attachment, UploadOutcome, UploadRejection, UploadStage};
use helloworld_processing::{sanitize_upload_name, MediaValidator};
use helloworld_storage::{join_clean, FileStore, StorageError};

pub struct UploadPipeline {
    store: Arc<dyn FileStore>,
    validator: MediaValidator,
    /// Directory inside the store receiving images
    image_path: String,
    timeout: Duration,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn FileStore>,
        validator: MediaValidator,
        image_path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            validator,
            image_path: image_path.into(),
            timeout,
        }
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    #[tracing::instrument(skip_all, fields(original_name = tracing::field::Empty))]
    pub async fn process(&self, attachment: Option<&Attachment>) -> UploadOutcome {
        let attachment = match attachment {
            Some(a) if !a.error_code.is_no_file() => a,
            _ => {
                tracing::debug!("No file provided");
                return UploadOutcome::NoFileProvided;
            }
        };
        tracing::Span::current().record("original_name", attachment.original_name.as_str());

        if !attachment.error_code.is_ok() {
            return self.reject(UploadRejection::UploadError(attachment.error_code));
        }
        tracing::debug!(stage = %UploadStage::HasFile, size_bytes = attachment.size_bytes, "Upload received");

        let name = match sanitize_upload_name(&attachment.original_name) {
            Some(name) => name,
            None => return self.reject(UploadRejection::FilenameInvalid),
        };
        tracing::debug!(stage = %UploadStage::NameSanitized, name = %name, "Filename cleaned");

        if let Err(e) = self.check_media_policy(attachment, &name).await {
            return self.reject(e);
        }
        tracing::debug!(stage = %UploadStage::MediaPolicyChecked, "Media policy passed");

        let relative_path = match join_clean(&self.image_path, &name) {
            Ok(path) => path,
            Err(e) => return self.reject(UploadRejection::StoreFailed(e.to_string())),
        };

        match self.bounded(self.store.exists(&relative_path)).await {
            Ok(false) => {}
            Ok(true) => return self.reject(UploadRejection::FileExists(relative_path)),
            Err(e) => return self.reject(store_rejection(e, &relative_path)),
        }
        tracing::debug!(stage = %UploadStage::PathResolved, path = %relative_path, "Destination is free");

        match self
            .bounded(self.store.store_upload(&attachment.temp_location, &relative_path))
            .await
        {
            Ok(bytes) => {
                tracing::info!(
                    stage = %UploadStage::Uploaded,
                    path = %relative_path,
                    size_bytes = bytes,
                    "Upload stored"
                );
                UploadOutcome::Stored(relative_path)
            }
            Err(e) => self.reject(store_rejection(e, &relative_path)),
        }
    }

    async fn check_media_policy(
        &self,
        attachment: &Attachment,
        name: &str,
    ) -> Result<(), UploadRejection> {
        // Cheap checks before touching the spooled bytes.
        let declared_size = usize::try_from(attachment.size_bytes).unwrap_or(usize::MAX);
        self.validator
            .validate_file_size(declared_size)
            .and_then(|_| self.validator.validate_extension(name))
            .map_err(|e| {
                tracing::debug!(error = %e, "Media policy rejected upload");
                UploadRejection::MediaPolicy(e.user_message())
            })?;

        let data = self
            .bounded(async {
                tokio::fs::read(&attachment.temp_location)
                    .await
                    .map_err(StorageError::from)
            })
            .await
            .map_err(|e| UploadRejection::StoreFailed(e.to_string()))?;

        self.validator
            .validate_all(name, &attachment.declared_mime_type, &data)
            .map_err(|e| {
                tracing::debug!(error = %e, "Media policy rejected upload");
                UploadRejection::MediaPolicy(e.user_message())
            })
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| {
                StorageError::BackendError(format!(
                    "file store timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
    }

    fn reject(&self, rejection: UploadRejection) -> UploadOutcome {
        tracing::warn!(stage = %rejection.stage(), reason = ?rejection, "Upload rejected");
        UploadOutcome::Rejected(rejection)
    }
}

fn store_rejection(err: StorageError, relative_path: &str) -> UploadRejection {
    match err {
        StorageError::AlreadyExists(_) => UploadRejection::FileExists(relative_path.to_string()),
        other => UploadRejection::StoreFailed(other.to_string()),
    }
}
