//! Common error types used across all Metamorphosis services

use thiserror::Error;

/// Common service error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
