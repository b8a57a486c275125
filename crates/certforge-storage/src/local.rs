use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::{ObjectAcl, StorageBackend};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Used for development deployments that mirror artifacts into a directory
/// served by a static file server instead of a bucket.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/certforge/public")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.base_path.join(storage_key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Map the object ACL onto file mode bits: world-readable for public
    /// objects, owner-only otherwise.
    #[cfg(unix)]
    async fn apply_acl(path: &Path, acl: ObjectAcl) -> StorageResult<()> {
        use std::os::unix::fs::PermissionsExt;

        let mode = match acl {
            ObjectAcl::PublicRead => 0o644,
            ObjectAcl::Private => 0o600,
        };
        fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn apply_acl(_path: &Path, _acl: ObjectAcl) -> StorageResult<()> {
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
        acl: ObjectAcl,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;
        drop(file);

        Self::apply_acl(&path, acl).await?;

        let url = self.public_url(storage_key);

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            acl = %acl,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(url)
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
