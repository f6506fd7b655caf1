//! Error types for the object store

use axum::http::StatusCode;
use morph_core::problemdetails::{self, Problem};
use thiserror::Error;

/// Errors that can occur while storing or removing objects
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed for {key}: {message}")]
    DeleteFailed { key: String, message: String },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Object storage misconfigured: {0}")]
    Configuration(String),
}

impl From<BlobError> for Problem {
    fn from(error: BlobError) -> Self {
        match error {
            BlobError::UploadFailed(msg) => problemdetails::new(StatusCode::BAD_GATEWAY)
                .with_title("Upload Failed")
                .with_detail(msg),

            BlobError::DeleteFailed { key, message } => {
                problemdetails::new(StatusCode::BAD_GATEWAY)
                    .with_title("Delete Failed")
                    .with_detail(format!("Could not delete '{}': {}", key, message))
            }

            BlobError::NotFound(key) => problemdetails::new(StatusCode::NOT_FOUND)
                .with_title("Object Not Found")
                .with_detail(format!("Object '{}' does not exist", key)),

            BlobError::InvalidUpload(msg) => problemdetails::new(StatusCode::BAD_REQUEST)
                .with_title("Invalid Upload")
                .with_detail(msg),

            BlobError::Configuration(msg) => {
                problemdetails::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_title("Storage Misconfigured")
                    .with_detail(msg)
            }
        }
    }
}
