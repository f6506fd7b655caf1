use chrono::{DateTime, TimeDelta, Utc};
use clap::Args;
use morph_core::DatabaseConfig;
use morph_registration::{DbRegistrationStore, RegistrationStore};
use tracing::{info, warn};

/// Delete participants that no registration references.
///
/// A registration that fails after its participants were written tries to
/// delete them right away. When that cleanup fails too the rows stay behind
/// and this command removes them.
#[derive(Args)]
pub struct SweepOrphansCommand {
    /// Database connection URL (postgres:// or sqlite:)
    #[arg(long, env = "MORPH_DATABASE_URL")]
    pub database_url: String,

    /// Only sweep participants created at least this many minutes ago, so
    /// that registrations still in flight are left alone
    #[arg(long, default_value_t = 60)]
    pub older_than_minutes: i64,
}

impl SweepOrphansCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run())
    }

    async fn run(self) -> anyhow::Result<()> {
        let cutoff = cutoff(Utc::now(), self.older_than_minutes)?;

        let config = DatabaseConfig::new(&self.database_url);
        let db = morph_database::establish_connection(&config).await?;
        let store = DbRegistrationStore::new(db);

        info!("Sweeping orphan participants created before {}", cutoff);

        let swept = store.sweep_orphan_participants(cutoff).await?;
        if swept.is_empty() {
            info!("No orphan participants found");
        } else {
            warn!(pids = ?swept, "Deleted {} orphan participant(s)", swept.len());
        }

        Ok(())
    }
}

/// `now` minus the grace period
fn cutoff(now: DateTime<Utc>, older_than_minutes: i64) -> anyhow::Result<DateTime<Utc>> {
    if older_than_minutes < 0 {
        anyhow::bail!("--older-than-minutes must not be negative");
    }

    TimeDelta::try_minutes(older_than_minutes)
        .and_then(|grace| now.checked_sub_signed(grace))
        .ok_or_else(|| {
            anyhow::anyhow!("--older-than-minutes {} is too large", older_than_minutes)
        })
}
