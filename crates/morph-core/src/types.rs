//! Shared type aliases

use chrono::{DateTime, Utc};

/// Database DateTime type used across all Metamorphosis crates
///
/// Maps to TIMESTAMPTZ on PostgreSQL and to RFC 3339 text on SQLite.
pub type DBDateTime = DateTime<Utc>;
