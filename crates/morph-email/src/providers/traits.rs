//! Transport-independent message types

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::Address;
use serde::{Deserialize, Serialize};

use crate::errors::EmailError;

/// A single HTML email to one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to_address: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
}

impl OutgoingEmail {
    pub fn new(
        to_address: impl Into<String>,
        to_name: Option<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            to_address: to_address.into(),
            to_name,
            subject: subject.into(),
            html_body: html_body.into(),
        }
    }

    /// The recipient as a parsed mailbox
    pub fn recipient(&self) -> Result<Mailbox, EmailError> {
        let name = self.to_name.clone().filter(|n| !n.trim().is_empty());
        Ok(Mailbox::new(name, parse_address(&self.to_address)?))
    }
}

pub(crate) fn parse_address(address: &str) -> Result<Address, EmailError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| EmailError::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        })
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;

    /// Short transport name for logs
    fn transport_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_with_name() {
        let email = OutgoingEmail::new(
            "bob@example.com",
            Some("Bob".into()),
            "Welcome",
            "<p>hi</p>",
        );
        let mailbox = email.recipient().unwrap();
        assert_eq!(mailbox.to_string(), "Bob <bob@example.com>");
    }

    #[test]
    fn test_blank_name_is_dropped() {
        let email = OutgoingEmail::new("bob@example.com", Some(" ".into()), "s", "b");
        assert_eq!(email.recipient().unwrap().to_string(), "bob@example.com");
    }

    #[test]
    fn test_invalid_address() {
        let email = OutgoingEmail::new("not-an-address", None, "s", "b");
        assert!(matches!(
            email.recipient(),
            Err(EmailError::InvalidAddress { .. })
        ));
    }
}
