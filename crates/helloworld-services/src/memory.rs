//! In-process record store and user directory, used when `DATABASE_URL` is unset.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use helloworld_core::models::{Greeting, RecordId, UserProfile, ValidatedRecord};
use helloworld_core::{AppError, RecordStore, UserDirectory};

#[derive(Default)]
struct Inner {
    next_id: RecordId,
    records: Vec<Greeting>,
    /// lowercase word -> ids of greetings containing it
    index: HashMap<String, BTreeSet<RecordId>>,
}

/// Greetings kept in memory with a simple word index
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
    fail_saves_with: Mutex<Option<String>>,
    reindex_calls: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `save` fail with the given message
    pub fn fail_saves_with(&self, message: impl Into<String>) {
        *self.fail_saves_with.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    pub fn records(&self) -> Vec<Greeting> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .records
            .clone()
    }

    pub fn reindex_calls(&self) -> usize {
        self.reindex_calls.load(Ordering::SeqCst)
    }

    /// Ids of indexed greetings containing `word`
    pub fn search(&self, word: &str) -> Vec<RecordId> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .index
            .get(&word.to_lowercase())
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn save(&self, record: &ValidatedRecord) -> Result<RecordId, AppError> {
        if let Some(message) = self
            .fail_saves_with
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(AppError::Storage(message));
        }

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(path) = &record.image_path {
            if inner
                .records
                .iter()
                .any(|r| r.image_path.as_deref() == Some(path.as_str()))
            {
                return Err(AppError::Storage(format!(
                    "duplicate key value violates unique constraint on image_path: {}",
                    path
                )));
            }
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push(Greeting {
            id,
            greeting: record.greeting.clone(),
            image_path: record.image_path.clone(),
            created_by: record.created_by,
            created_at: Utc::now(),
        });

        tracing::info!(record_id = id, "Greeting stored in memory");
        Ok(id)
    }

    async fn reindex(&self, id: RecordId) -> Result<(), AppError> {
        self.reindex_calls.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let greeting = inner
            .records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.greeting.clone())
            .ok_or_else(|| AppError::NotFound(format!("Greeting {} not found", id)))?;

        for ids in inner.index.values_mut() {
            ids.remove(&id);
        }
        for word in greeting
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            inner.index.entry(word.to_lowercase()).or_default().insert(id);
        }
        inner.index.retain(|_, ids| !ids.is_empty());

        Ok(())
    }
}

/// Fixed set of users
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<i64, UserProfile>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: UserProfile) -> Self {
        self.users
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user.id, user);
        self
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_user(&self, id: i64) -> Result<Option<UserProfile>, AppError> {
        Ok(self
            .users
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned())
    }
}
