use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::{ObjectAcl, StorageBackend};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bytes::Bytes;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(region.clone()));

        let retry_config = RetryConfig::standard()
            .with_max_attempts(5)
            .with_retry_mode(RetryMode::Adaptive);

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(retry_config.clone())
            .load()
            .await;

        let client = if let Some(ref endpoint) = endpoint_url {
            let mut s3_config_builder = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .endpoint_url(endpoint)
                .region(config.region().cloned())
                .retry_config(retry_config);
            if let Some(provider) = config.credentials_provider() {
                s3_config_builder = s3_config_builder.credentials_provider(provider);
            }
            // MinIO and friends need path-style addressing
            s3_config_builder = s3_config_builder.force_path_style(true);

            Client::from_conf(s3_config_builder.build())
        } else {
            Client::new(&config)
        };

        Ok(S3Storage {
            client,
            bucket,
            region,
            endpoint_url,
        })
    }

    fn canned_acl(acl: ObjectAcl) -> ObjectCannedAcl {
        match acl {
            ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
            ObjectAcl::Private => ObjectCannedAcl::Private,
        }
    }
}

/// Public URL of an object.
///
/// AWS uses the virtual-hosted form `https://{bucket}.s3.{region}.amazonaws.com/{key}`;
/// custom endpoints use the path-style form `{endpoint}/{bucket}/{key}`.
pub fn public_object_url(
    bucket: &str,
    region: &str,
    endpoint_url: Option<&str>,
    key: &str,
) -> String {
    match endpoint_url {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
        acl: ObjectAcl,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;

        let size = data.len() as u64;
        let body = ByteStream::from(Bytes::from(data));
        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .body(body)
            .content_type(content_type)
            .acl(Self::canned_acl(acl))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let url = self.public_url(storage_key);

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            acl = %acl,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(url)
    }

    fn public_url(&self, storage_key: &str) -> String {
        public_object_url(
            &self.bucket,
            &self.region,
            self.endpoint_url.as_deref(),
            storage_key,
        )
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
