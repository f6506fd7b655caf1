//! morph-blob: Object storage for uploaded files
//!
//! Stores payment proof images in an S3-compatible bucket, or in process
//! memory when no bucket is configured.

pub mod error;
pub mod services;

pub use error::BlobError;
pub use services::{
    object_store_from_config, MemoryObjectStore, ObjectStorageConfig, ObjectStore,
    S3ObjectStore, StoredObject, UploadRequest,
};
