//! Object store seam used to publish certificate artifacts.

use crate::{ObjectAcl, StorageBackend};
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single storage operation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A bucket-like store addressed by caller-chosen keys.
///
/// Keys follow the rules in the crate root documentation; backends reject
/// anything else with `StorageError::InvalidKey`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key`, replacing any existing object, and
    /// return the object's public URL.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
        acl: ObjectAcl,
    ) -> StorageResult<String>;

    /// Public URL an object stored under `storage_key` is served from.
    fn public_url(&self, storage_key: &str) -> String;

    fn backend_type(&self) -> StorageBackend;
}
