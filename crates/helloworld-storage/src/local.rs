use crate::path::clean_path;
use crate::safety::inspect_upload;
use crate::traits::{FileStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem store rooted at the media directory
#[derive(Clone, Debug)]
pub struct LocalFileStore {
    base_path: PathBuf,
}

impl LocalFileStore {
    /// Create a new LocalFileStore, creating the root directory if needed
    ///
    /// # Arguments
    /// * `base_path` - Media root (e.g., "/var/www/site"); stored paths are relative to it
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalFileStore { base_path })
    }

    pub fn root(&self) -> &Path {
        &self.base_path
    }

    /// Convert a relative path to a filesystem path with security validation
    ///
    /// Rejects traversal segments and anything that resolves outside the root, including
    /// through symlinks that already exist.
    fn key_to_path(&self, relative_path: &str) -> StorageResult<PathBuf> {
        let cleaned = clean_path(relative_path)?;
        let path = self.base_path.join(&cleaned);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        // Walk up to the deepest ancestor that exists and make sure it sits under the root.
        let mut probe = path.as_path();
        loop {
            if let Ok(canonical) = probe.canonicalize() {
                if canonical.strip_prefix(&base_canonical).is_err() {
                    return Err(StorageError::InvalidKey(
                        "Path resolves outside storage directory".to_string(),
                    ));
                }
                break;
            }
            match probe.parent() {
                Some(parent) => probe = parent,
                None => break,
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn exists(&self, relative_path: &str) -> StorageResult<bool> {
        let path = self.key_to_path(relative_path)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn store_upload(&self, source: &Path, relative_path: &str) -> StorageResult<u64> {
        let path = self.key_to_path(relative_path)?;
        let start = std::time::Instant::now();

        let data = fs::read(source).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to read upload {}: {}",
                source.display(),
                e
            ))
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(relative_path);
        inspect_upload(name, &data)?;

        self.ensure_parent_dir(&path).await?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(relative_path.to_string()));
            }
            Err(e) => {
                return Err(StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let written: std::io::Result<()> = async {
            file.write_all(&data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            // Do not leave a truncated file occupying the name.
            if let Err(cleanup) = fs::remove_file(&path).await {
                tracing::warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "Failed to remove partially written upload"
                );
            }
            return Err(StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            key = %relative_path,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(data.len() as u64)
    }

    async fn read(&self, relative_path: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(relative_path)?;

        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(relative_path.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::BackendError(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    async fn delete(&self, relative_path: &str) -> StorageResult<()> {
        let path = self.key_to_path(relative_path)?;

        if !fs::try_exists(&path).await? {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), key = %relative_path, "Local storage delete successful");

        Ok(())
    }
}
