use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// How many leading bytes are scanned for HTML markup
const HTML_SNIFF_BYTES: usize = 256;

/// Tags that mark an upload as an HTML payload in disguise
const HTML_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "area", "b", "base", "basefont", "bdo", "big",
    "blockquote", "body", "br", "button", "caption", "center", "cite", "code", "col",
    "colgroup", "dd", "del", "dfn", "dir", "div", "dl", "dt", "em", "embed", "fieldset",
    "font", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "hr",
    "html", "i", "iframe", "img", "input", "ins", "isindex", "kbd", "label", "legend", "li",
    "link", "map", "menu", "meta", "noframes", "noscript", "object", "ol", "optgroup",
    "option", "p", "param", "pre", "q", "s", "samp", "script", "select", "small", "span",
    "strike", "strong", "style", "sub", "sup", "svg", "table", "tbody", "td", "textarea",
    "tfoot", "th", "thead", "title", "tr", "tt", "u", "ul", "var",
];

/// Media policy violations
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,

    #[error("File content does not match its extension: {0}")]
    ContentMismatch(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("File contains HTML markup")]
    HtmlContent,
}

impl ValidationError {
    /// Message shown to the visitor when the upload is refused.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::FileTooLarge { max, .. } => format!(
                "This file is too large to upload. The maximum size is {} MB.",
                max / 1024 / 1024
            ),
            ValidationError::InvalidExtension { .. }
            | ValidationError::InvalidContentType { .. }
            | ValidationError::InvalidFilename(_) => {
                "This file type is not supported.".to_string()
            }
            ValidationError::EmptyFile => "The uploaded file is empty.".to_string(),
            ValidationError::ContentMismatch(_) | ValidationError::InvalidImage(_) => {
                "Invalid image. The file could not be read as an image.".to_string()
            }
            ValidationError::HtmlContent => {
                "Possible IE XSS attack found. The file was rejected.".to_string()
            }
        }
    }
}

/// Media policy validator for uploaded images
///
/// Checks are pure functions of the file name, declared content type and bytes.
pub struct MediaValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|c| c.to_lowercase())
                .collect(),
        }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = extension_of(filename)?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate content type; parameters such as `; charset=` are ignored
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_mime_type(content_type);

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate that the declared content type agrees with the file extension
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let extension = extension_of(filename)?;
        let normalized = normalize_mime_type(content_type);

        let expected: &[&str] = match extension.as_str() {
            "jpg" | "jpeg" => &["image/jpeg", "image/pjpeg"],
            "png" => &["image/png", "image/x-png"],
            "gif" => &["image/gif"],
            "webp" => &["image/webp"],
            "bmp" => &["image/bmp", "image/x-ms-bmp"],
            "ico" => &["image/x-icon", "image/vnd.microsoft.icon"],
            _ => {
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "Unknown extension, skipping Content-Type/extension cross-validation"
                );
                return Ok(());
            }
        };

        if !expected.iter().any(|ct| *ct == normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: format!(
                    "{} (does not match extension '{}'. Expected one of: {})",
                    content_type,
                    extension,
                    expected.join(", ")
                ),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Sniff the real format from magic bytes and make sure the header decodes.
    pub fn validate_image_content(
        &self,
        filename: &str,
        data: &[u8],
    ) -> Result<(u32, u32), ValidationError> {
        let extension = extension_of(filename)?;

        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ValidationError::InvalidImage(e.to_string()))?;

        let format = reader.format().ok_or_else(|| {
            ValidationError::ContentMismatch(format!("{} is not a recognized image", filename))
        })?;

        if !format_matches_extension(format, &extension) {
            return Err(ValidationError::ContentMismatch(format!(
                "{} contains {:?} data",
                filename, format
            )));
        }

        let dimensions = reader
            .into_dimensions()
            .map_err(|e| ValidationError::InvalidImage(e.to_string()))?;

        if dimensions.0 == 0 || dimensions.1 == 0 {
            return Err(ValidationError::InvalidImage(format!(
                "{} has zero dimensions",
                filename
            )));
        }

        Ok(dimensions)
    }

    /// Reject files whose first bytes carry HTML markup.
    pub fn validate_no_html(&self, data: &[u8]) -> Result<(), ValidationError> {
        let head = &data[..data.len().min(HTML_SNIFF_BYTES)];
        let text = String::from_utf8_lossy(head).to_lowercase();

        for tag in HTML_TAGS {
            let open = format!("<{}", tag);
            let mut search = text.as_str();
            while let Some(pos) = search.find(&open) {
                let after = &search[pos + open.len()..];
                // `<b` must not match `<body`; only a tag boundary counts.
                match after.chars().next() {
                    None | Some('>') | Some(' ') | Some('/') | Some('\t') | Some('\n')
                    | Some('\r') => return Err(ValidationError::HtmlContent),
                    _ => search = after,
                }
            }
            if text.contains(&format!("</{}>", tag)) {
                return Err(ValidationError::HtmlContent);
            }
        }

        Ok(())
    }

    /// Validate all aspects of an upload
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<(), ValidationError> {
        self.validate_file_size(data.len())?;
        self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(filename, content_type)?;
        self.validate_image_content(filename, data)?;
        self.validate_no_html(data)?;
        Ok(())
    }
}

fn extension_of(filename: &str) -> Result<String, ValidationError> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))
}

/// Strip parameters ("image/jpeg; charset=utf-8" -> "image/jpeg") and lowercase.
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

fn format_matches_extension(format: ImageFormat, extension: &str) -> bool {
    format
        .extensions_str()
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension))
}
