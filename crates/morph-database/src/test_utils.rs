//! Test utilities for database integration tests
//!
//! Every [`TestDatabase`] is a private in-memory SQLite database with the
//! full schema applied, so tests never share state.

use crate::DbConnection;
use morph_migrations::Migrator;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, Statement};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

pub const IN_MEMORY_URL: &str = "sqlite::memory:";

pub struct TestDatabase {
    pub db: Arc<DbConnection>,
}

impl TestDatabase {
    /// Create a fresh database and run all migrations against it
    pub async fn with_migrations() -> anyhow::Result<Self> {
        let test_db = Self::new().await?;
        Migrator::up(test_db.db.as_ref(), None)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
        Ok(test_db)
    }

    /// Create a fresh database without any schema
    pub async fn new() -> anyhow::Result<Self> {
        let mut opt = ConnectOptions::new(IN_MEMORY_URL);
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        let db = Database::connect(opt).await?;
        let test_db = TestDatabase { db: Arc::new(db) };
        test_db.test_connection().await?;
        Ok(test_db)
    }

    pub async fn test_connection(&self) -> anyhow::Result<()> {
        let probe = Statement::from_string(DatabaseBackend::Sqlite, "SELECT 1".to_owned());
        self.db
            .query_one(probe)
            .await?
            .ok_or_else(|| anyhow::anyhow!("SELECT 1 returned no rows"))?;
        Ok(())
    }

    pub fn connection(&self) -> Arc<DbConnection> {
        self.db.clone()
    }
}
