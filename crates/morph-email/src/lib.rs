//! Email delivery for the Metamorphosis registration backend
//!
//! Messages go out through an SMTP relay when one is configured. Without one
//! the crate runs in capture mode: messages are recorded and logged instead of
//! being delivered.

pub mod config;
pub mod errors;
pub mod providers;

pub use config::{SmtpConfig, TlsMode, DEFAULT_SMTP_PORT};
pub use errors::EmailError;
pub use providers::{mailer_from_config, CaptureMailer, Mailer, OutgoingEmail, SmtpMailer};
