//! Metamorphosis CLI - Single entrypoint for the registration backend
//!
//! Runs the registration API server and the maintenance commands that go
//! with it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ServeCommand, SweepOrphansCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MORPH_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "MORPH_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the registration API server
    Serve(ServeCommand),
    /// Delete participants left behind by failed registrations
    SweepOrphans(SweepOrphansCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level.clone();

    // If RUST_LOG is set, use it directly; otherwise use our default filter
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid RUST_LOG environment variable: {}", e))?
    } else {
        // All morph crates at the requested level, noisy dependencies at warn
        tracing_subscriber::EnvFilter::new(format!(
            "morph={level},\
             morph_cli={level},\
             morph_core={level},\
             morph_database={level},\
             morph_migrations={level},\
             morph_blob={level},\
             morph_email={level},\
             morph_registration={level},\
             tower_http={level},\
             sqlx=warn,\
             sea_orm=warn,\
             sea_orm_migration=warn,\
             aws_config=warn,\
             aws_smithy_runtime=warn,\
             lettre=warn,\
             h2=warn,\
             hyper=warn,\
             rustls=warn",
            level = log_level
        ))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global default subscriber: {}", e))?;

    match cli.command {
        Commands::Serve(serve_cmd) => serve_cmd.execute(),
        Commands::SweepOrphans(sweep_cmd) => sweep_cmd.execute(),
    }
}
