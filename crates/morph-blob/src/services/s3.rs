//! S3-compatible object store

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region, SharedCredentialsProvider};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use super::config::ObjectStorageConfig;
use super::object_store::{object_key, ObjectStore, StoredObject, UploadRequest};
use crate::error::BlobError;

/// Stores objects in an S3 bucket or an S3-compatible service
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3ObjectStore {
    pub async fn new(config: &ObjectStorageConfig) -> Result<Self, BlobError> {
        let bucket = config
            .bucket
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| BlobError::Configuration("bucket name is required".into()))?
            .to_string();

        debug!("Creating S3 object store for bucket {} in {}", bucket, config.region);

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some((access_key, secret_key)) = config.credentials() {
            let credentials = Credentials::new(access_key, secret_key, None, None, "morph-blob");
            loader = loader.credentials_provider(SharedCredentialsProvider::new(credentials));
        }

        // Custom endpoint for MinIO and friends
        if let Some(endpoint) = config.endpoint.as_deref() {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&shared);

        // Force path-style addressing for S3-compatible services
        if config.endpoint.is_some() {
            s3_config = s3_config.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(s3_config.build()),
            public_base: public_base_url(config, &bucket),
            bucket,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL of the object stored under `key`
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

/// Base URL that object keys are appended to
fn public_base_url(config: &ObjectStorageConfig, bucket: &str) -> String {
    if let Some(public) = config.public_url.as_deref().filter(|u| !u.is_empty()) {
        return public.trim_end_matches('/').to_string();
    }

    match config.endpoint.as_deref() {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", bucket, config.region),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(
        &self,
        folder: &str,
        request: UploadRequest,
    ) -> Result<StoredObject, BlobError> {
        let key = object_key(folder, &request.file_name);
        let content_type = request.resolved_content_type();
        let size = request.body.len() as u64;

        debug!("PUT s3://{}/{} ({} bytes, {})", self.bucket, key, size, content_type);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(request.body))
            .content_type(&content_type)
            .send()
            .await
            .map_err(|e| BlobError::UploadFailed(e.to_string()))?;

        Ok(StoredObject {
            url: self.object_url(&key),
            key,
            size,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        debug!("DELETE s3://{}/{}", self.bucket, key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BlobError::DeleteFailed {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ObjectStorageConfig {
        ObjectStorageConfig {
            bucket: Some("proofs".into()),
            region: "ap-south-1".into(),
            access_key: Some("AKIA".into()),
            secret_key: Some("secret".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_public_url_prefers_configured_base() {
        let config = ObjectStorageConfig {
            public_url: Some("https://cdn.example.org/".into()),
            endpoint: Some("http://localhost:9000".into()),
            ..config()
        };
        assert_eq!(public_base_url(&config, "proofs"), "https://cdn.example.org");
    }

    #[test]
    fn test_public_url_from_custom_endpoint() {
        let config = ObjectStorageConfig {
            endpoint: Some("http://localhost:9000/".into()),
            ..config()
        };
        assert_eq!(
            public_base_url(&config, "proofs"),
            "http://localhost:9000/proofs"
        );
    }

    #[test]
    fn test_public_url_for_aws() {
        assert_eq!(
            public_base_url(&config(), "proofs"),
            "https://proofs.s3.ap-south-1.amazonaws.com"
        );
    }

    #[tokio::test]
    async fn test_new_requires_bucket() {
        let config = ObjectStorageConfig {
            bucket: None,
            ..config()
        };
        let result = S3ObjectStore::new(&config).await;
        assert!(matches!(result, Err(BlobError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_object_url_appends_key() {
        let store = S3ObjectStore::new(&ObjectStorageConfig {
            endpoint: Some("http://localhost:9000".into()),
            ..config()
        })
        .await
        .unwrap();

        assert_eq!(store.bucket(), "proofs");
        assert_eq!(
            store.object_url("metamorphosis/abc.png"),
            "http://localhost:9000/proofs/metamorphosis/abc.png"
        );
    }
}
