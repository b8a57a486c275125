//! Publication of rendered artifacts to object storage.

use certforge_core::models::{ArtifactPaths, PublishedArtifactKeys};
use certforge_core::{CertificateError, CertificateResult};
use certforge_storage::{ObjectAcl, Storage};
use std::path::Path;
use std::sync::Arc;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Uploads the document and its preview, world-readable, under keys equal
/// to their workspace-relative paths.
#[derive(Clone)]
pub struct ArtifactPublisher {
    storage: Arc<dyn Storage>,
}

impl ArtifactPublisher {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Upload the document, then the image. An earlier upload is not undone
    /// when a later one fails.
    pub async fn publish(&self, paths: &ArtifactPaths) -> CertificateResult<PublishedArtifactKeys> {
        self.upload(&paths.certificate_path, &paths.certificate_key, PDF_CONTENT_TYPE)
            .await?;
        self.upload(&paths.image_path, &paths.image_key, JPEG_CONTENT_TYPE)
            .await?;

        Ok(paths.keys())
    }

    async fn upload(&self, local: &Path, key: &str, content_type: &str) -> CertificateResult<()> {
        let data = tokio::fs::read(local).await.map_err(|e| {
            CertificateError::Publish(format!("cannot read {}: {}", local.display(), e))
        })?;

        let url = self
            .storage
            .upload_with_key(key, data, content_type, ObjectAcl::PublicRead)
            .await
            .map_err(|e| CertificateError::Publish(format!("{}: {}", key, e)))?;

        tracing::info!(
            key = %key,
            url = %url,
            backend = %self.storage.backend_type(),
            "Artifact published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certforge_core::models::{BaseFilename, RenderDetails};
    use certforge_storage::LocalStorage;
    use tempfile::tempdir;

    fn paths(root: &Path) -> ArtifactPaths {
        let details = RenderDetails {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            date: "2024-01-10".to_string(),
            course_name: "Systems Design".to_string(),
            course_desc: "Intro".to_string(),
            verify_url: "http://host/verify/abc123".to_string(),
        };
        ArtifactPaths::new(root, "pdf/test", BaseFilename::from_details(&details))
    }

    #[tokio::test]
    async fn test_publishes_both_artifacts() {
        let workspace = tempdir().unwrap();
        let bucket = tempdir().unwrap();
        let paths = paths(workspace.path());
        std::fs::create_dir_all(paths.certificate_path.parent().unwrap()).unwrap();
        std::fs::write(&paths.certificate_path, b"%PDF-doc").unwrap();
        std::fs::write(&paths.image_path, b"jpeg").unwrap();

        let storage = LocalStorage::new(bucket.path(), "http://cdn.test".to_string())
            .await
            .unwrap();
        let publisher = ArtifactPublisher::new(Arc::new(storage));

        let keys = publisher.publish(&paths).await.unwrap();

        assert_eq!(
            keys.certificate_key,
            "pdf/test/ada_lovelace_2024-01-10_systems_design.pdf"
        );
        assert_eq!(
            std::fs::read(bucket.path().join(&keys.certificate_key)).unwrap(),
            b"%PDF-doc"
        );
        assert_eq!(
            std::fs::read(bucket.path().join(&keys.image_key)).unwrap(),
            b"jpeg"
        );
    }

    #[tokio::test]
    async fn test_missing_image_fails_after_document_upload() {
        let workspace = tempdir().unwrap();
        let bucket = tempdir().unwrap();
        let paths = paths(workspace.path());
        std::fs::create_dir_all(paths.certificate_path.parent().unwrap()).unwrap();
        std::fs::write(&paths.certificate_path, b"%PDF-doc").unwrap();

        let storage = LocalStorage::new(bucket.path(), "http://cdn.test".to_string())
            .await
            .unwrap();
        let publisher = ArtifactPublisher::new(Arc::new(storage));

        let err = publisher.publish(&paths).await.unwrap_err();
        assert!(matches!(err, CertificateError::Publish(_)));
        // no rollback of the sibling
        assert!(bucket.path().join(&paths.certificate_key).exists());
    }
}
