#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use certforge_core::Config;
use std::sync::Arc;

/// Storage backend selected by `STORAGE_BACKEND`.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let backend = config.storage_backend();
    tracing::debug!(backend = %backend, "Creating storage backend");
    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config
                .s3_region()
                .or_else(|| config.aws_region())
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(bucket, region, endpoint).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use certforge_core::GeneratorConfig;

    #[tokio::test]
    async fn test_local_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(GeneratorConfig {
            storage_backend: StorageBackend::Local,
            local_storage_path: Some(dir.path().display().to_string()),
            local_storage_base_url: Some("http://localhost:3000/files".to_string()),
            ..GeneratorConfig::default()
        });

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert_eq!(
            storage.public_url("pdf/test/a.pdf"),
            "http://localhost:3000/files/pdf/test/a.pdf"
        );
    }

    #[tokio::test]
    async fn test_local_backend_requires_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(GeneratorConfig {
            storage_backend: StorageBackend::Local,
            local_storage_path: Some(dir.path().display().to_string()),
            local_storage_base_url: None,
            ..GeneratorConfig::default()
        });

        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[cfg(feature = "storage-s3")]
    #[tokio::test]
    async fn test_s3_backend_requires_bucket() {
        let config = Config::new(GeneratorConfig {
            storage_backend: StorageBackend::S3,
            s3_bucket: None,
            ..GeneratorConfig::default()
        });

        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
