//! Test helpers: a fully wired `SubmissionProcessor` over in-memory collaborators and a
//! temporary media root.

#![allow(dead_code)]

use async_trait::async_trait;
use helloworld_core::models::{
    Attachment, FormData, Principal, Submission, UploadErrorCode, UserProfile,
};
use helloworld_core::{AppError, Notifier, UserDirectory};
use helloworld_processing::{FormSchema, MediaValidator};
use helloworld_services::{
    CsrfTokenService, MemoryRecordStore, MemorySessionStore, MemoryUserDirectory,
    NotificationService, StaticAuthorization, SubmissionProcessor, SubmissionRequest,
    TokenService, UploadPipeline,
};
use helloworld_storage::LocalFileStore;
use image::{ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const ADMIN_ID: i64 = 7;
pub const RETURN_URI: &str = "/index.php?option=com_helloworld&view=form&layout=edit";

/// One captured outbound message
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that records instead of sending
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Mail("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// User directory whose backend is down
pub struct BrokenUserDirectory;

#[async_trait]
impl UserDirectory for BrokenUserDirectory {
    async fn find_user(&self, _id: i64) -> Result<Option<UserProfile>, AppError> {
        Err(AppError::Internal("user table unavailable".to_string()))
    }
}

pub fn admin() -> UserProfile {
    UserProfile {
        id: ADMIN_ID,
        username: "admin".to_string(),
        email: "admin@example.com".to_string(),
    }
}

pub struct Harness {
    pub processor: SubmissionProcessor,
    pub records: Arc<MemoryRecordStore>,
    pub session: Arc<MemorySessionStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub tokens: Arc<CsrfTokenService>,
    pub media: TempDir,
    pub spool: TempDir,
}

pub struct HarnessBuilder {
    allow_guests: bool,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<RecordingNotifier>,
    recipient_id: Option<i64>,
    schema: Option<FormSchema>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            allow_guests: true,
            users: Arc::new(MemoryUserDirectory::new().with_user(admin())),
            notifier: Arc::new(RecordingNotifier::default()),
            recipient_id: Some(ADMIN_ID),
            schema: None,
        }
    }
}

impl HarnessBuilder {
    pub fn deny_guests(mut self) -> Self {
        self.allow_guests = false;
        self
    }

    pub fn users(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = users;
        self
    }

    pub fn notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn recipient(mut self, recipient_id: Option<i64>) -> Self {
        self.recipient_id = recipient_id;
        self
    }

    pub fn schema(mut self, schema: FormSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub async fn build(self) -> Harness {
        let media = TempDir::new().unwrap();
        let spool = TempDir::new().unwrap();

        let records = Arc::new(MemoryRecordStore::new());
        let session = Arc::new(MemorySessionStore::new());
        let tokens = Arc::new(CsrfTokenService::new("test-secret"));

        let store = LocalFileStore::new(media.path()).await.unwrap();
        let validator = MediaValidator::new(
            1024 * 1024,
            ["bmp", "gif", "jpg", "jpeg", "png", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ["image/bmp", "image/gif", "image/jpeg", "image/png", "image/webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let uploads = UploadPipeline::new(
            Arc::new(store),
            validator,
            "images",
            Duration::from_secs(5),
        );
        let notifications = NotificationService::new(
            self.notifier.clone(),
            self.users,
            self.recipient_id,
            Duration::from_secs(5),
        );

        let processor = SubmissionProcessor::new(
            Arc::new(StaticAuthorization::new(self.allow_guests)),
            Arc::new(
                self.schema
                    .unwrap_or_else(|| FormSchema::add_greeting_form().unwrap()),
            ),
            records.clone(),
            uploads,
            notifications,
            session.clone(),
            tokens.clone(),
        );

        Harness {
            processor,
            records,
            session,
            notifier: self.notifier,
            tokens,
            media,
            spool,
        }
    }
}

impl Harness {
    pub async fn new() -> Self {
        HarnessBuilder::default().build().await
    }

    /// A request carrying a freshly issued token
    pub fn request(
        &self,
        principal: &Principal,
        fields: FormData,
        attachment: Option<Attachment>,
    ) -> SubmissionRequest {
        SubmissionRequest {
            submission: Submission::new(fields, attachment),
            token: Some(self.tokens.issue(&principal.session_id).unwrap()),
            return_uri: RETURN_URI.to_string(),
        }
    }

    /// Spool `data` the way the multipart layer would
    pub fn attachment(&self, name: &str, mime: &str, data: &[u8]) -> Attachment {
        let temp_location = self
            .spool
            .path()
            .join(format!("upload-{}", uuid::Uuid::new_v4()));
        std::fs::write(&temp_location, data).unwrap();
        Attachment {
            original_name: name.to_string(),
            declared_mime_type: mime.to_string(),
            temp_location,
            size_bytes: data.len() as u64,
            error_code: UploadErrorCode::OK,
        }
    }
}

pub fn greeting(text: &str) -> FormData {
    [("greeting", text)].into_iter().collect()
}

pub fn png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Rgb([10, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
