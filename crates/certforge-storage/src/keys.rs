//! Shared key validation for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape the storage root or that S3 and the local
/// filesystem would interpret differently.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.starts_with('/') || storage_key.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key must be relative and '/'-separated: {}",
            storage_key
        )));
    }
    if storage_key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains an invalid segment: {}",
            storage_key
        )));
    }
    Ok(())
}
