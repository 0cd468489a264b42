//! Storage abstraction trait
//!
//! This module defines the FileStore trait that every upload backend implements.

use async_trait::async_trait;
use helloworld_core::AppError;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    /// Destination is occupied; the store never overwrites.
    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage path: {0}")]
    InvalidKey(String),

    /// Content or name failed the safety inspection.
    #[error("Unsafe upload: {0}")]
    UnsafeContent(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Storage for uploaded files, addressed by paths relative to the store root.
///
/// `store_upload` has create-if-absent semantics: when the destination already exists it
/// fails with `StorageError::AlreadyExists` and leaves the existing file untouched. Callers
/// may probe with `exists` first, but the store is the authority on conflicts.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Check if a file exists at the relative path
    async fn exists(&self, relative_path: &str) -> StorageResult<bool>;

    /// Copy the spooled upload at `source` to `relative_path`, returning the bytes written.
    ///
    /// The content is inspected before anything is written; unsafe uploads fail with
    /// `StorageError::UnsafeContent`.
    async fn store_upload(&self, source: &Path, relative_path: &str) -> StorageResult<u64>;

    /// Read a stored file back
    async fn read(&self, relative_path: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file; deleting a missing file is not an error
    async fn delete(&self, relative_path: &str) -> StorageResult<()>;
}
