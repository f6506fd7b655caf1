//! Configuration management utilities

use serde::{Deserialize, Serialize};

/// Default upper bound of pooled database connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;
/// Default lower bound of pooled database connections
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Configuration for `url` with the default pool bounds
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
        }
    }

    /// Whether the URL points at SQLite rather than PostgreSQL
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// Whether the URL points at a transient in-memory SQLite database
    pub fn is_in_memory(&self) -> bool {
        self.is_sqlite() && self.url.contains(":memory:")
    }
}
