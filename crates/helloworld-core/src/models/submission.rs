use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::FormData;

/// Numeric upload status reported by the multipart layer for the file part.
///
/// Values follow the long-standing web convention (0 = ok, 4 = no file selected, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadErrorCode(pub u8);

impl UploadErrorCode {
    pub const OK: UploadErrorCode = UploadErrorCode(0);
    /// File exceeds the server-wide upload limit
    pub const INI_SIZE: UploadErrorCode = UploadErrorCode(1);
    /// File exceeds the limit declared by the form
    pub const FORM_SIZE: UploadErrorCode = UploadErrorCode(2);
    pub const PARTIAL: UploadErrorCode = UploadErrorCode(3);
    pub const NO_FILE: UploadErrorCode = UploadErrorCode(4);
    pub const NO_TMP_DIR: UploadErrorCode = UploadErrorCode(6);
    pub const CANT_WRITE: UploadErrorCode = UploadErrorCode(7);
    pub const EXTENSION: UploadErrorCode = UploadErrorCode(8);

    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    pub fn is_no_file(self) -> bool {
        self == Self::NO_FILE
    }
}

impl fmt::Display for UploadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw descriptor of the uploaded file part, exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub original_name: String,
    pub declared_mime_type: String,
    /// Where the multipart layer spooled the bytes
    pub temp_location: PathBuf,
    pub size_bytes: u64,
    pub error_code: UploadErrorCode,
}

impl Attachment {
    /// Descriptor for a file input that was left empty.
    pub fn not_selected() -> Self {
        Self {
            original_name: String::new(),
            declared_mime_type: String::new(),
            temp_location: PathBuf::new(),
            size_bytes: 0,
            error_code: UploadErrorCode::NO_FILE,
        }
    }
}

/// One untrusted form payload plus its optional file. Lives for a single request.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fields: FormData,
    pub attachment: Option<Attachment>,
    /// Flipped only after the form schema accepted `fields`
    pub validated: bool,
}

impl Submission {
    pub fn new(fields: FormData, attachment: Option<Attachment>) -> Self {
        Self {
            fields,
            attachment,
            validated: false,
        }
    }
}

/// Stages of the upload pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    HasFile,
    NameSanitized,
    MediaPolicyChecked,
    PathResolved,
    Uploaded,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::HasFile => "has_file",
            UploadStage::NameSanitized => "name_sanitized",
            UploadStage::MediaPolicyChecked => "media_policy_checked",
            UploadStage::PathResolved => "path_resolved",
            UploadStage::Uploaded => "uploaded",
        };
        f.write_str(name)
    }
}

/// Why the upload pipeline refused a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    UploadError(UploadErrorCode),
    FilenameInvalid,
    /// Message written by the media policy
    MediaPolicy(String),
    FileExists(String),
    StoreFailed(String),
}

impl UploadRejection {
    /// The stage the pipeline was trying to reach when it gave up.
    pub fn stage(&self) -> UploadStage {
        match self {
            UploadRejection::UploadError(_) => UploadStage::HasFile,
            UploadRejection::FilenameInvalid => UploadStage::NameSanitized,
            UploadRejection::MediaPolicy(_) => UploadStage::MediaPolicyChecked,
            UploadRejection::FileExists(_) => UploadStage::PathResolved,
            UploadRejection::StoreFailed(_) => UploadStage::Uploaded,
        }
    }
}

/// Result of running one attachment through the upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    NoFileProvided,
    Rejected(UploadRejection),
    /// Relative path under the media root
    Stored(String),
}

impl UploadOutcome {
    pub fn stored_path(&self) -> Option<&str> {
        match self {
            UploadOutcome::Stored(path) => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_file_code() {
        assert!(UploadErrorCode(4).is_no_file());
        assert!(!UploadErrorCode::PARTIAL.is_no_file());
        assert!(Attachment::not_selected().error_code.is_no_file());
    }

    #[test]
    fn test_rejection_stage() {
        assert_eq!(
            UploadRejection::FileExists("images/a.png".to_string()).stage(),
            UploadStage::PathResolved
        );
        assert_eq!(UploadRejection::FilenameInvalid.stage().to_string(), "name_sanitized");
    }
}
