mod api;
mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use morph_blob::ObjectStorageConfig;
use morph_core::DatabaseConfig;
use morph_email::{Mailer, SmtpConfig, TlsMode, DEFAULT_SMTP_PORT};
use morph_registration::{
    ConfirmationNotifier, DbRegistrationStore, EventDetails, RegistrationPipeline,
    RegistrationSettings,
};
use tracing::{debug, info};

pub use api::{build_router, start_api_server};

#[derive(Args)]
pub struct ServeCommand {
    /// Address to bind the server to
    #[arg(long, default_value = "0.0.0.0:5000", env = "MORPH_ADDRESS")]
    pub address: String,

    /// Database connection URL (postgres:// or sqlite:)
    #[arg(long, env = "MORPH_DATABASE_URL")]
    pub database_url: String,

    /// Upper bound of pooled database connections
    #[arg(
        long,
        default_value_t = morph_core::DEFAULT_MAX_CONNECTIONS,
        env = "MORPH_DATABASE_MAX_CONNECTIONS"
    )]
    pub database_max_connections: u32,

    /// Allowed CORS origins, comma separated. Any origin when unset
    #[arg(long, env = "MORPH_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    #[command(flatten)]
    pub smtp: SmtpArgs,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub registration: RegistrationArgs,

    #[command(flatten)]
    pub event: EventArgs,
}

#[derive(Args)]
pub struct SmtpArgs {
    /// SMTP relay host. Emails are only logged when unset
    #[arg(long, env = "MORPH_SMTP_HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, default_value_t = DEFAULT_SMTP_PORT, env = "MORPH_SMTP_PORT")]
    pub smtp_port: u16,

    #[arg(long, env = "MORPH_SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    #[arg(long, env = "MORPH_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Sender address, defaults to the SMTP username
    #[arg(long, env = "MORPH_MAIL_FROM")]
    pub mail_from: Option<String>,

    #[arg(long, env = "MORPH_MAIL_FROM_NAME")]
    pub mail_from_name: Option<String>,

    /// Transport security: none, starttls, tls
    #[arg(long, default_value = "starttls", env = "MORPH_SMTP_TLS")]
    pub smtp_tls: String,
}

#[derive(Args)]
pub struct StorageArgs {
    /// Bucket for payment proofs. Required unless --in-memory-storage is set
    #[arg(long, env = "MORPH_S3_BUCKET", required_unless_present = "in_memory_storage")]
    pub s3_bucket: Option<String>,

    /// Keep payment proofs in process memory. They are lost on restart
    #[arg(long, env = "MORPH_IN_MEMORY_STORAGE")]
    pub in_memory_storage: bool,

    #[arg(long, default_value = morph_blob::services::DEFAULT_REGION, env = "MORPH_S3_REGION")]
    pub s3_region: String,

    /// Endpoint of an S3-compatible service
    #[arg(long, env = "MORPH_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    #[arg(long, env = "MORPH_S3_ACCESS_KEY")]
    pub s3_access_key: Option<String>,

    #[arg(long, env = "MORPH_S3_SECRET_KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,

    /// Base URL objects are served from
    #[arg(long, env = "MORPH_S3_PUBLIC_URL")]
    pub s3_public_url: Option<String>,
}

#[derive(Args)]
pub struct RegistrationArgs {
    #[arg(
        long,
        default_value = morph_registration::settings::DEFAULT_UPLOAD_FOLDER,
        env = "MORPH_UPLOAD_FOLDER"
    )]
    pub upload_folder: String,

    /// Largest accepted submission in megabytes
    #[arg(long, default_value_t = 10, env = "MORPH_MAX_PAYLOAD_MB")]
    pub max_payload_mb: usize,

    /// Deadline for the upload and the database writes of one submission
    #[arg(long, default_value_t = 30, env = "MORPH_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// Bound on each confirmation email
    #[arg(long, default_value_t = 30, env = "MORPH_NOTIFICATION_TIMEOUT_SECS")]
    pub notification_timeout_secs: u64,
}

#[derive(Args)]
pub struct EventArgs {
    #[arg(long, env = "MORPH_EVENT_NAME")]
    pub event_name: Option<String>,

    #[arg(long, env = "MORPH_EVENT_DATES")]
    pub event_dates: Option<String>,

    #[arg(long, env = "MORPH_EVENT_TIME")]
    pub event_time: Option<String>,

    #[arg(long, env = "MORPH_EVENT_VENUE")]
    pub event_venue: Option<String>,

    #[arg(long, env = "MORPH_EVENT_WEBSITE")]
    pub event_website: Option<String>,
}

impl SmtpArgs {
    fn config(&self) -> anyhow::Result<SmtpConfig> {
        let tls_mode: TlsMode = self.smtp_tls.parse()?;
        Ok(SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from_address: self.mail_from.clone(),
            from_name: self.mail_from_name.clone(),
            tls_mode,
        })
    }
}

impl StorageArgs {
    fn config(&self) -> ObjectStorageConfig {
        ObjectStorageConfig {
            bucket: self.s3_bucket.clone(),
            region: self.s3_region.clone(),
            endpoint: self.s3_endpoint.clone(),
            access_key: self.s3_access_key.clone(),
            secret_key: self.s3_secret_key.clone(),
            public_url: self.s3_public_url.clone(),
            in_memory: self.in_memory_storage,
        }
    }
}

impl RegistrationArgs {
    fn settings(&self) -> anyhow::Result<RegistrationSettings> {
        let Some(max_payload_bytes) = self.max_payload_mb.checked_mul(1024 * 1024) else {
            anyhow::bail!("--max-payload-mb {} is too large", self.max_payload_mb);
        };

        Ok(RegistrationSettings {
            upload_folder: self.upload_folder.clone(),
            max_payload_bytes,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            notification_timeout: Duration::from_secs(self.notification_timeout_secs),
        })
    }
}

impl EventArgs {
    fn details(&self) -> EventDetails {
        let mut event = EventDetails::default();
        let overrides = [
            (&self.event_name, &mut event.name),
            (&self.event_dates, &mut event.dates),
            (&self.event_time, &mut event.time),
            (&self.event_venue, &mut event.venue),
            (&self.event_website, &mut event.website),
        ];
        for (value, slot) in overrides {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
        event
    }
}

impl ServeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run())
    }

    async fn run(self) -> anyhow::Result<()> {
        let smtp_config = self.smtp.config()?;
        let storage_config = self.storage.config();
        let settings = self.registration.settings()?;
        let event = self.event.details();

        let mut database_config = DatabaseConfig::new(self.database_url.clone());
        database_config.max_connections = self.database_max_connections;

        debug!("Initializing database connection...");
        let db = morph_database::establish_connection(&database_config).await?;

        let store = Arc::new(DbRegistrationStore::new(db.clone()));
        let objects = morph_blob::object_store_from_config(&storage_config).await?;
        let mailer = morph_email::mailer_from_config(&smtp_config)?;
        debug!("Using {} mail transport", mailer.transport_name());

        let notifier = ConfirmationNotifier::new(
            mailer,
            store.clone(),
            event.clone(),
            settings.notification_timeout,
        );
        let pipeline = Arc::new(RegistrationPipeline::new(store, objects, notifier, settings));

        info!(
            "Starting registration server for {} on {}",
            event.name, self.address
        );

        let app = build_router(pipeline, event, &self.cors_origins)?;
        start_api_server(&self.address, app).await?;

        shutdown::close_database(db).await;
        Ok(())
    }
}
