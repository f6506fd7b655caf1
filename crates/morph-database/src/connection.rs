//! Database connection management

use morph_core::{DatabaseConfig, ServiceError, ServiceResult};
use morph_migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tracing::{debug, info};

pub type DbConnection = DatabaseConnection;

/// Connects to the configured database and applies pending migrations.
pub async fn establish_connection(config: &DatabaseConfig) -> ServiceResult<Arc<DbConnection>> {
    let mut opt = ConnectOptions::new(config.url.as_str());
    if config.is_in_memory() {
        // Every pooled connection to `sqlite::memory:` opens its own database
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections);
    }
    opt.sqlx_logging(false);

    debug!(
        sqlite = config.is_sqlite(),
        max_connections = config.max_connections,
        "Connecting to database"
    );

    let db = Database::connect(opt)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    Migrator::up(&db, None)
        .await
        .map_err(|e| ServiceError::Migration(e.to_string()))?;

    info!("Database ready, migrations applied");

    Ok(Arc::new(db))
}
