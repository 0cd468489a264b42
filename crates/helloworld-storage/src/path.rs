//! Relative path normalization.

use crate::traits::{StorageError, StorageResult};

/// Normalize a store-relative path.
///
/// Backslashes become `/`, repeated separators and `.` segments collapse away. Absolute
/// paths, `..` segments and paths that clean down to nothing are rejected.
pub fn clean_path(raw: &str) -> StorageResult<String> {
    let unified = raw.replace('\\', "/");

    if unified.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Path must be relative: {}",
            raw
        )));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(StorageError::InvalidKey(format!(
                    "Path contains a parent directory segment: {}",
                    raw
                )))
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(StorageError::InvalidKey("Path is empty".to_string()));
    }

    Ok(segments.join("/"))
}

/// `clean_path(dir + "/" + name)`
pub fn join_clean(dir: &str, name: &str) -> StorageResult<String> {
    clean_path(&format!("{}/{}", dir, name))
}
