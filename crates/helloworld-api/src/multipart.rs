//! Multipart extraction of the add-greeting form
//!
//! Text parts named `jform[<field>]` become form fields. The image part is spooled to a
//! temporary file that lives as long as the returned `SubmissionForm`. Transport problems with
//! the file part are reported through the conventional upload codes instead of failing the
//! request, so the processor decides what the visitor sees.

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use helloworld_core::models::{Attachment, FormData, UploadErrorCode};
use helloworld_core::AppError;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::constants::{CSRF_FIELD, IMAGE_FIELD, RETURN_FIELD};

/// Parsed request body
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub fields: FormData,
    pub attachment: Option<Attachment>,
    pub token: Option<String>,
    pub return_to: Option<String>,
    /// Deletes the spooled upload on drop
    spool: Option<TempPath>,
}

impl SubmissionForm {
    pub fn spool_path(&self) -> Option<&std::path::Path> {
        self.spool.as_deref()
    }
}

/// `jform[greeting]` -> `greeting`; `jform[tags][]` -> `tags` (repeated).
fn form_field_name(name: &str) -> Option<(&str, bool)> {
    let inner = name.strip_prefix("jform[")?;
    let (field, rest) = inner.split_once(']')?;
    if field.is_empty() {
        return None;
    }
    match rest {
        "" => Some((field, false)),
        "[]" => Some((field, true)),
        _ => None,
    }
}

pub async fn read_submission(
    mut multipart: Multipart,
    upload_max_bytes: usize,
) -> Result<SubmissionForm, AppError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD {
            if form.attachment.is_some() {
                tracing::debug!("Ignoring repeated image part");
                continue;
            }
            let (attachment, spool) = spool_file(field, upload_max_bytes).await?;
            form.attachment = Some(attachment);
            form.spool = spool;
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Unreadable form field '{}': {}", name, e)))?;

        if name == CSRF_FIELD {
            form.token = Some(value);
        } else if name == RETURN_FIELD {
            form.return_to = Some(value);
        } else if let Some((field_name, repeated)) = form_field_name(&name) {
            if repeated {
                form.fields.push(field_name, value);
            } else {
                form.fields.insert(field_name, value);
            }
        } else {
            tracing::debug!(field = %name, "Ignoring unknown form part");
        }
    }

    Ok(form)
}

async fn spool_file(
    mut field: Field<'_>,
    upload_max_bytes: usize,
) -> Result<(Attachment, Option<TempPath>), AppError> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    let declared_mime_type = field.content_type().unwrap_or_default().to_string();

    if original_name.is_empty() {
        return Ok((Attachment::not_selected(), None));
    }

    let spool = tempfile::NamedTempFile::new()?.into_temp_path();
    let mut file = tokio::fs::File::create(&spool).await?;
    let mut size: usize = 0;
    let mut error_code = UploadErrorCode::OK;

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                size += chunk.len();
                if size > upload_max_bytes {
                    error_code = UploadErrorCode::INI_SIZE;
                    break;
                }
                if let Err(e) = file.write_all(&chunk).await {
                    tracing::warn!(error = %e, "Failed to spool upload");
                    error_code = UploadErrorCode::CANT_WRITE;
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Upload interrupted");
                error_code = UploadErrorCode::PARTIAL;
                break;
            }
        }
    }

    if error_code.is_ok() {
        if let Err(e) = file.flush().await {
            tracing::warn!(error = %e, "Failed to flush spooled upload");
            error_code = UploadErrorCode::CANT_WRITE;
        }
    }

    tracing::debug!(
        original_name = %original_name,
        size_bytes = size,
        error_code = %error_code,
        "Upload spooled"
    );

    let attachment = Attachment {
        original_name,
        declared_mime_type,
        temp_location: spool.to_path_buf(),
        size_bytes: size as u64,
        error_code,
    };
    Ok((attachment, Some(spool)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_field_name() {
        assert_eq!(form_field_name("jform[greeting]"), Some(("greeting", false)));
        assert_eq!(form_field_name("jform[tags][]"), Some(("tags", true)));
        assert_eq!(form_field_name("jform[imageinfo][image]"), None);
        assert_eq!(form_field_name("jform[]"), None);
        assert_eq!(form_field_name("greeting"), None);
    }
}
