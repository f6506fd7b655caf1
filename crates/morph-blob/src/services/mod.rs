//! Object store implementations

mod config;
mod memory;
mod object_store;
mod s3;

use std::sync::Arc;

use tracing::warn;

pub use config::{ObjectStorageConfig, DEFAULT_REGION};
pub use memory::MemoryObjectStore;
pub use object_store::{object_key, ObjectStore, StoredObject, UploadRequest};
pub use s3::S3ObjectStore;

use crate::error::BlobError;

/// Build the store described by `config`.
///
/// A bucket is required unless `in_memory` is set, in which case objects
/// live in process memory and are lost on restart.
pub async fn object_store_from_config(
    config: &ObjectStorageConfig,
) -> Result<Arc<dyn ObjectStore>, BlobError> {
    if config.in_memory {
        warn!("Using in-memory object storage, uploaded files are lost on restart");
        return Ok(Arc::new(MemoryObjectStore::new()));
    }

    if !config.is_configured() {
        return Err(BlobError::Configuration(
            "no S3 bucket configured, set a bucket or enable in-memory storage".to_string(),
        ));
    }

    Ok(Arc::new(S3ObjectStore::new(config).await?))
}
