//! In-process object store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use super::object_store::{object_key, ObjectStore, StoredObject, UploadRequest};
use crate::error::BlobError;

/// An object held by [`MemoryObjectStore`]
#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub content_type: String,
    pub body: Bytes,
}

/// Keeps objects in a map for local runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, MemoryObject>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<MemoryObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        folder: &str,
        request: UploadRequest,
    ) -> Result<StoredObject, BlobError> {
        let key = object_key(folder, &request.file_name);
        let content_type = request.resolved_content_type();
        let size = request.body.len() as u64;

        debug!("PUT memory://{} ({} bytes, {})", key, size, content_type);

        self.objects.write().await.insert(
            key.clone(),
            MemoryObject {
                content_type,
                body: request.body,
            },
        );

        Ok(StoredObject {
            url: format!("memory://{}", key),
            key,
            size,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        debug!("DELETE memory://{}", key);
        match self.objects.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(BlobError::NotFound(key.to_string())),
        }
    }
}
