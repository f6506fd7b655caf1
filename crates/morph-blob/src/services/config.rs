//! Object storage configuration

use serde::{Deserialize, Serialize};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for an S3-compatible bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    pub bucket: Option<String>,

    pub region: String,

    /// Custom endpoint for S3-compatible services (MinIO, R2, Spaces)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    #[serde(skip_serializing)]
    pub secret_key: Option<String>,

    /// Base URL under which stored objects are publicly reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Keep objects in process memory instead of a bucket. Development only
    pub in_memory: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            public_url: None,
            in_memory: false,
        }
    }
}

impl ObjectStorageConfig {
    pub fn is_configured(&self) -> bool {
        self.bucket.as_deref().is_some_and(|b| !b.trim().is_empty())
    }

    /// Static credentials, when both halves are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key.as_deref(), self.secret_key.as_deref()) {
            (Some(access), Some(secret)) if !access.is_empty() && !secret.is_empty() => {
                Some((access, secret))
            }
            _ => None,
        }
    }
}
