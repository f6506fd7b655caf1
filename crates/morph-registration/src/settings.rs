//! Tunables for the registration pipeline and the event it registers for

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_UPLOAD_FOLDER: &str = "metamorphosis";
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    /// Object store folder that proof images are uploaded into
    pub upload_folder: String,
    /// Upper bound on text fields plus attachment, in bytes
    pub max_payload_bytes: usize,
    /// Shared deadline for upload and persistence
    pub request_timeout: Duration,
    /// Per-recipient bound on a confirmation send
    pub notification_timeout: Duration,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            upload_folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            notification_timeout: DEFAULT_NOTIFICATION_TIMEOUT,
        }
    }
}

/// Event facts shown on the landing route and in confirmation emails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDetails {
    pub name: String,
    pub dates: String,
    pub time: String,
    pub venue: String,
    pub website: String,
    pub organiser: String,
    /// What the sessions focus on
    pub theme: String,
}

impl Default for EventDetails {
    fn default() -> Self {
        Self {
            name: "MetaMorphosis 2K25".to_string(),
            dates: "15th & 16th of February, 2025".to_string(),
            time: "9:00 AM".to_string(),
            venue: "Main & Mini CCF, WCE".to_string(),
            website: "https://meta2k25.wcewlug.org/".to_string(),
            organiser: "Walchand Linux Users' Group".to_string(),
            theme: "Docker & Kubernetes".to_string(),
        }
    }
}

impl EventDetails {
    /// Subject line of confirmation emails and the landing greeting
    pub fn welcome(&self) -> String {
        format!("Welcome to {}", self.name)
    }
}
