//! Collaborator traits
//!
//! The submission processor never talks to a concrete framework. Everything it needs from
//! the outside world (access control, persistence, session storage, user lookup, mail
//! delivery) is injected as one of these traits. Concrete implementations live in
//! `helloworld-db` (Postgres) and `helloworld-services` (in-memory, SMTP).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;
use crate::models::{Principal, RecordId, UserProfile, ValidatedRecord};

/// Answers "can this principal perform this action on this asset?"
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn authorize(&self, principal: &Principal, action: &str, asset: &str) -> bool;
}

/// Durable storage for accepted greetings.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist the record and return its id.
    async fn save(&self, record: &ValidatedRecord) -> Result<RecordId, AppError>;

    /// Rebuild derived data (search index, ordering) after a save. Must be idempotent.
    async fn reindex(&self, id: RecordId) -> Result<(), AppError>;
}

/// Short-lived per-session key/value storage.
#[async_trait]
pub trait SessionState: Send + Sync {
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<Value>, AppError>;

    async fn set(&self, session_id: &str, key: &str, value: Value) -> Result<(), AppError>;

    async fn clear(&self, session_id: &str, key: &str) -> Result<(), AppError>;

    /// Read and remove in one step.
    async fn take(&self, session_id: &str, key: &str) -> Result<Option<Value>, AppError> {
        let value = self.get(session_id, key).await?;
        if value.is_some() {
            self.clear(session_id, key).await?;
        }
        Ok(value)
    }
}

/// Lookup of registered users, used to resolve notification recipients.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<UserProfile>, AppError>;
}

/// Outbound message transport (e.g. SMTP).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Notifier used when mail is not configured; drops every message.
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), AppError> {
        tracing::debug!(to = %to, subject = %subject, "Mail disabled, dropping notification");
        Ok(())
    }
}
