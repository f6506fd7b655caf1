use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::{MigratorTrait, SchemaManager};

use morph_migrations::Migrator;

const TABLES: [&str; 3] = ["counters", "participants", "registrations"];

async fn connect() -> anyhow::Result<DatabaseConnection> {
    // A single connection keeps every query on the same in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);
    Ok(Database::connect(options).await?)
}

/// Test that migrations can be applied successfully
#[tokio::test]
async fn test_migration_up() -> anyhow::Result<()> {
    let db = connect().await?;

    Migrator::up(&db, None).await?;

    let manager = SchemaManager::new(&db);
    for table in TABLES {
        assert!(manager.has_table(table).await?, "missing table {}", table);
    }
    assert!(manager.has_column("participants", "dual_boot").await?);
    assert!(manager.has_column("registrations", "referral_code").await?);

    Ok(())
}

/// Test that migrations can be rolled back successfully
#[tokio::test]
async fn test_migration_down() -> anyhow::Result<()> {
    let db = connect().await?;

    Migrator::up(&db, None).await?;
    Migrator::down(&db, None).await?;

    let manager = SchemaManager::new(&db);
    for table in TABLES {
        assert!(!manager.has_table(table).await?, "table {} survived", table);
    }

    Ok(())
}

/// Applying twice is a no-op
#[tokio::test]
async fn test_migration_status() -> anyhow::Result<()> {
    let db = connect().await?;

    Migrator::up(&db, None).await?;
    Migrator::up(&db, None).await?;

    let pending = Migrator::get_pending_migrations(&db).await?;
    assert!(pending.is_empty());

    let applied = Migrator::get_applied_migrations(&db).await?;
    assert_eq!(applied.len(), 1);

    Ok(())
}
