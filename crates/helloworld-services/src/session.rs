//! Session storage
//!
//! `MemorySessionStore` keeps per-session key/value state in process. It backs a single
//! instance deployment and the tests; sessions idle past the timeout are forgotten.
//! `FlashMessages` queues visitor-facing messages in any `SessionState` until the next
//! render drains them.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use helloworld_core::constants::FLASH_MESSAGES_KEY;
use helloworld_core::models::FlashMessage;
use helloworld_core::{AppError, SessionState};

/// Sessions untouched for this long are dropped
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

struct SessionEntry {
    values: HashMap<String, Value>,
    last_seen: Instant,
}

/// In-process session state
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    idle_timeout: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_SESSION_IDLE_TIMEOUT)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Number of keys held for a session
    pub fn key_count(&self, session_id: &str) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .filter(|entry| !self.is_expired(entry, Instant::now()))
            .map_or(0, |entry| entry.values.len())
    }

    /// Number of sessions currently held, expired ones included until the next sweep
    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.duration_since(entry.last_seen) > self.idle_timeout
    }

    fn sweep(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle sessions");
        }
    }
}

#[async_trait]
impl SessionState for MemorySessionStore {
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<Value>, AppError> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        Ok(sessions
            .get(session_id)
            .filter(|entry| !self.is_expired(entry, Instant::now()))
            .and_then(|entry| entry.values.get(key))
            .cloned())
    }

    async fn set(&self, session_id: &str, key: &str, value: Value) -> Result<(), AppError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        self.sweep(&mut sessions, now);

        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                values: HashMap::new(),
                last_seen: now,
            });
        entry.last_seen = now;
        entry.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn clear(&self, session_id: &str, key: &str) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = sessions.get_mut(session_id) {
            entry.values.remove(key);
            if entry.values.is_empty() {
                sessions.remove(session_id);
            }
        }
        Ok(())
    }

    async fn take(&self, session_id: &str, key: &str) -> Result<Option<Value>, AppError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if sessions
            .get(session_id)
            .is_some_and(|entry| self.is_expired(entry, now))
        {
            sessions.remove(session_id);
            return Ok(None);
        }

        let value = sessions.get_mut(session_id).and_then(|entry| {
            entry.last_seen = now;
            entry.values.remove(key)
        });
        if sessions
            .get(session_id)
            .is_some_and(|entry| entry.values.is_empty())
        {
            sessions.remove(session_id);
        }
        Ok(value)
    }
}

/// Message queue persisted in the session between requests.
#[derive(Clone)]
pub struct FlashMessages {
    session: Arc<dyn SessionState>,
}

impl FlashMessages {
    pub fn new(session: Arc<dyn SessionState>) -> Self {
        Self { session }
    }

    pub async fn enqueue(
        &self,
        session_id: &str,
        messages: &[FlashMessage],
    ) -> Result<(), AppError> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut queue = self.peek(session_id).await?;
        queue.extend_from_slice(messages);
        self.session
            .set(session_id, FLASH_MESSAGES_KEY, serde_json::to_value(&queue)?)
            .await
    }

    /// Queued messages without removing them
    pub async fn peek(&self, session_id: &str) -> Result<Vec<FlashMessage>, AppError> {
        match self.session.get(session_id, FLASH_MESSAGES_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Remove and return everything queued
    pub async fn drain(&self, session_id: &str) -> Result<Vec<FlashMessage>, AppError> {
        match self.session.take(session_id, FLASH_MESSAGES_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helloworld_core::models::{MessageKey, MessageLevel};
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_clear() {
        let store = MemorySessionStore::new();
        store.set("s1", "k", json!({"a": 1})).await.unwrap();

        assert_eq!(store.get("s1", "k").await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(store.get("s2", "k").await.unwrap(), None);

        store.clear("s1", "k").await.unwrap();
        assert_eq!(store.get("s1", "k").await.unwrap(), None);
        assert_eq!(store.key_count("s1"), 0);
    }

    #[tokio::test]
    async fn test_take_is_one_shot() {
        let store = MemorySessionStore::new();
        store.set("s1", "k", json!("v")).await.unwrap();

        assert_eq!(store.take("s1", "k").await.unwrap(), Some(json!("v")));
        assert_eq!(store.take("s1", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flash_messages_roundtrip() {
        let store: Arc<dyn SessionState> = Arc::new(MemorySessionStore::new());
        let flash = FlashMessages::new(store);

        flash
            .enqueue(
                "s1",
                &[FlashMessage::from_key(
                    MessageLevel::Message,
                    MessageKey::AddSuccessful,
                    &[],
                )],
            )
            .await
            .unwrap();
        flash
            .enqueue("s1", &[FlashMessage::text(MessageLevel::Warning, "second")])
            .await
            .unwrap();

        assert_eq!(flash.peek("s1").await.unwrap().len(), 2);

        let drained = flash.drain("s1").await.unwrap();
        assert_eq!(drained.len(), 2);
        assert!(drained[0].has_key(MessageKey::AddSuccessful));
        assert!(flash.drain("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = MemorySessionStore::with_idle_timeout(Duration::from_millis(20));
        store.set("abandoned", "k", json!("stale")).await.unwrap();
        assert_eq!(store.session_count(), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("abandoned", "k").await.unwrap(), None);
        assert_eq!(store.key_count("abandoned"), 0);

        // The next write sweeps the abandoned session away.
        store.set("active", "k", json!("fresh")).await.unwrap();
        assert_eq!(store.session_count(), 1);
        assert_eq!(store.get("active", "k").await.unwrap(), Some(json!("fresh")));
    }

    #[tokio::test]
    async fn test_default_timeout_keeps_recent_sessions() {
        let store = MemorySessionStore::new();
        store.set("s1", "k", json!(1)).await.unwrap();
        store.set("s2", "k", json!(2)).await.unwrap();

        assert_eq!(store.session_count(), 2);
        assert_eq!(store.take("s1", "k").await.unwrap(), Some(json!(1)));
    }
}
