//! SMTP configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EmailError;

/// Submission port used when none is configured
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain connection
    None,
    /// Upgrade with STARTTLS
    #[default]
    Starttls,
    /// Implicit TLS (SMTPS)
    Tls,
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsMode::None => write!(f, "none"),
            TlsMode::Starttls => write!(f, "starttls"),
            TlsMode::Tls => write!(f, "tls"),
        }
    }
}

impl FromStr for TlsMode {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "plain" | "off" => Ok(TlsMode::None),
            "starttls" => Ok(TlsMode::Starttls),
            "tls" | "ssl" | "smtps" => Ok(TlsMode::Tls),
            other => Err(EmailError::Configuration(format!(
                "unknown TLS mode '{}', expected none, starttls or tls",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay host; `None` selects capture mode
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Sender address; falls back to the username
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub tls_mode: TlsMode,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
            from_address: None,
            from_name: None,
            tls_mode: TlsMode::default(),
        }
    }
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty())
    }

    /// Address messages are sent from
    pub fn sender_address(&self) -> Option<&str> {
        self.from_address
            .as_deref()
            .or(self.username.as_deref())
            .filter(|a| !a.trim().is_empty())
    }

    /// Credentials, when a non-empty username is configured
    pub fn credentials(&self) -> Option<(String, String)> {
        match &self.username {
            Some(username) if !username.is_empty() => Some((
                username.clone(),
                self.password.clone().unwrap_or_default(),
            )),
            _ => None,
        }
    }
}
