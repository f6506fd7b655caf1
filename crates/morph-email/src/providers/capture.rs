//! Capture-mode transport

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use super::traits::{Mailer, OutgoingEmail};
use crate::errors::EmailError;

/// Records messages instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct CaptureMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl CaptureMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages captured so far, oldest first
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl Mailer for CaptureMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        // Reject what a relay would reject
        let recipient = email.recipient()?;

        info!(
            to = %recipient,
            subject = %email.subject,
            bytes = email.html_body.len(),
            "Captured email"
        );

        self.sent.lock().await.push(email.clone());
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "capture"
    }
}
