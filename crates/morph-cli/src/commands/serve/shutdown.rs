use std::sync::Arc;
use std::time::Duration;

use morph_database::DbConnection;
use tracing::{debug, info, warn};

/// How long in-flight confirmation sends get to release the database
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// Close the pool once nothing else holds it
pub async fn close_database(mut db: Arc<DbConnection>) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;

    loop {
        match Arc::try_unwrap(db) {
            Ok(conn) => {
                if let Err(e) = conn.close().await {
                    warn!("Error closing database connection: {}", e);
                } else {
                    debug!("Database connection closed successfully");
                }
                return;
            }
            Err(shared) if tokio::time::Instant::now() < deadline => {
                db = shared;
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Err(_) => {
                debug!("Database still has other references, skipping close");
                return;
            }
        }
    }
}
