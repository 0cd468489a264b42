use serde::{Deserialize, Serialize};

/// Severity of a message queued for the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Message,
    Warning,
    Error,
}

/// Language keys the submission flow can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    AddSuccessful,
    AddCancelled,
    AlertNoAuthor,
    ErrorFileUpload,
    ErrorBadFilename,
    ErrorFileExists,
    ErrorUnableToUploadFile,
    SaveFailed,
}

impl MessageKey {
    pub fn key(self) -> &'static str {
        match self {
            MessageKey::AddSuccessful => "COM_HELLOWORLD_ADD_SUCCESSFUL",
            MessageKey::AddCancelled => "COM_HELLOWORLD_ADD_CANCELLED",
            MessageKey::AlertNoAuthor => "JERROR_ALERTNOAUTHOR",
            MessageKey::ErrorFileUpload => "COM_HELLOWORLD_ERROR_FILEUPLOAD",
            MessageKey::ErrorBadFilename => "COM_HELLOWORLD_ERROR_BADFILENAME",
            MessageKey::ErrorFileExists => "COM_HELLOWORLD_ERROR_FILE_EXISTS",
            MessageKey::ErrorUnableToUploadFile => "COM_HELLOWORLD_ERROR_UNABLE_TO_UPLOAD_FILE",
            MessageKey::SaveFailed => "JLIB_APPLICATION_ERROR_SAVE_FAILED",
        }
    }

    /// English template; `%s` placeholders are filled in order.
    fn template(self) -> &'static str {
        match self {
            MessageKey::AddSuccessful => "Greeting successfully added",
            MessageKey::AddCancelled => "Greeting addition cancelled",
            MessageKey::AlertNoAuthor => {
                "You are not permitted to use that link to directly access that page"
            }
            MessageKey::ErrorFileUpload => "Error in file upload, error code %s",
            MessageKey::ErrorBadFilename => "Bad filename, please rename the file and try again",
            MessageKey::ErrorFileExists => "A file with that name already exists",
            MessageKey::ErrorUnableToUploadFile => "Unable to upload file",
            MessageKey::SaveFailed => "Save failed with the following error: %s",
        }
    }

    pub fn render(self, args: &[&str]) -> String {
        let mut out = String::new();
        let mut args = args.iter();
        let mut rest = self.template();
        while let Some(pos) = rest.find("%s") {
            out.push_str(&rest[..pos]);
            out.push_str(args.next().copied().unwrap_or(""));
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// A message queued for display on the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: MessageLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub text: String,
}

impl FlashMessage {
    pub fn from_key(level: MessageLevel, key: MessageKey, args: &[&str]) -> Self {
        Self {
            level,
            key: Some(key.key().to_string()),
            text: key.render(args),
        }
    }

    /// Free-form message, e.g. a validator's own wording.
    pub fn text(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            key: None,
            text: text.into(),
        }
    }

    pub fn has_key(&self, key: MessageKey) -> bool {
        self.key.as_deref() == Some(key.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders() {
        assert_eq!(
            MessageKey::ErrorFileUpload.render(&["3"]),
            "Error in file upload, error code 3"
        );
        assert_eq!(
            MessageKey::SaveFailed.render(&["duplicate key"]),
            "Save failed with the following error: duplicate key"
        );
        assert_eq!(MessageKey::AddSuccessful.render(&[]), "Greeting successfully added");
    }

    #[test]
    fn test_flash_message_carries_key() {
        let msg = FlashMessage::from_key(MessageLevel::Error, MessageKey::AlertNoAuthor, &[]);
        assert_eq!(msg.key.as_deref(), Some("JERROR_ALERTNOAUTHOR"));
        assert!(msg.has_key(MessageKey::AlertNoAuthor));
        assert!(!FlashMessage::text(MessageLevel::Warning, "x").has_key(MessageKey::AlertNoAuthor));
    }
}
