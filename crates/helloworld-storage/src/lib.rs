//! Helloworld Storage Library
//!
//! File storage for uploaded greeting images: the `FileStore` trait, the local filesystem
//! backend, path cleaning and content-safety inspection.
//!
//! # Path format
//!
//! Paths handed to a store are relative to its root and use `/` as separator, for example
//! `images/my-photo.png`. They must not contain `..` segments or start with a separator.
//! `path::clean_path` produces such paths from a configured directory and a filename.

pub mod local;
pub mod path;
pub mod safety;
pub mod traits;

// Re-export commonly used types
pub use local::LocalFileStore;
pub use path::{clean_path, join_clean};
pub use safety::inspect_upload;
pub use traits::{FileStore, StorageError, StorageResult};
