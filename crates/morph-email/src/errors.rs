//! Error types for email delivery

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Invalid email address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Delivery timed out after {0}s")]
    Timeout(u64),
}

impl From<lettre::error::Error> for EmailError {
    fn from(err: lettre::error::Error) -> Self {
        EmailError::Message(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for EmailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        EmailError::Transport(err.to_string())
    }
}
