//! The object store abstraction shared by every backend

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::BlobError;

/// A file to be stored
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original client-side file name, used for the extension and type guess
    pub file_name: String,
    /// Declared content type; guessed from `file_name` when absent
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, body: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            body,
        }
    }

    /// The declared content type, or one guessed from the file extension
    pub fn resolved_content_type(&self) -> String {
        match self.content_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() => declared.to_string(),
            _ => mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }
}

/// Where an uploaded object ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    /// Publicly reachable URL of the object
    pub url: String,
    pub size: u64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `request` under a fresh key inside `folder`
    async fn upload(&self, folder: &str, request: UploadRequest) -> Result<StoredObject, BlobError>;

    /// Remove the object stored under `key`
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

/// Build `{folder}/{uuid}{ext}` for a new upload of `file_name`
pub fn object_key(folder: &str, file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{}{}", Uuid::new_v4(), extension)
    } else {
        format!("{}/{}{}", folder, Uuid::new_v4(), extension)
    }
}
