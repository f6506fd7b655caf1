//! Core utilities and types shared across all Metamorphosis crates

pub mod config;
pub mod error;
pub mod error_builder;
pub mod problemdetails;
pub mod types;

pub use problemdetails::ProblemDetails;

// Re-export commonly used types
pub use config::*;
pub use error::*;
pub use error_builder::*;
pub use types::*;

// Re-export external dependencies
pub use anyhow;
pub use chrono;
pub use serde_json;
pub use tracing;
