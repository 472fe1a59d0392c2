use clap::Parser;
use detect_ingest::config::Config;
use detect_ingest::pipeline::{ingest_file, Outcome};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "detect-ingest")]
#[command(about = "Load a DETECT NetCDF file into the map visualisation database")]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config/config.yaml", help = "Configuration file")]
    config: PathBuf,

    #[arg(help = "NetCDF file to ingest [default: dataset.file_path from the config]")]
    file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,detect_ingest=debug,sqlx=warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("DETECT ingestion starting...");

    let mut config = Config::load(&cli.config).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration: {}\n\n\
             Make sure:\n\
             1. {} exists\n\
             2. All required environment variables are set (check .env.example)\n\
             3. Create a .env file if needed",
            e,
            cli.config.display()
        )
    })?;
    if let Some(file) = cli.file {
        config.dataset.file_path = file;
    }
    info!("Configuration loaded");

    if let Some(label) = &config.dataset.value_column {
        info!("Measured quantity: {}", label);
    }

    let connection_string = config.database.connection_string();
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to connect to database: {}\n\n\
                 Host: {}:{}\n\
                 Database: {}\n\
                 User: {}\n\n\
                 Common fixes:\n\
                 1. Ensure PostgreSQL is running\n\
                 2. Check username/password are correct (DB_USER, DB_PASSWORD)\n\
                 3. Verify the PostGIS extension is installed in {}\n\
                 4. Check host and port (DB_HOST, DB_PORT)",
                e,
                config.database.host,
                config.database.port,
                config.database.name,
                config.database.user,
                config.database.name
            )
        })?;

    info!(
        "Connected to database: {}@{}:{}/{}",
        config.database.user, config.database.host, config.database.port, config.database.name
    );

    let report = ingest_file(&config.dataset.file_path, &pool, config.dataset.tables()).await;

    pool.close().await;
    info!("Connection closed");

    let record_failures = report.coordinates.as_ref().map_or(0, |c| c.failures.len())
        + report.series.as_ref().map_or(0, |s| s.failures.len());

    match &report.outcome {
        Outcome::Completed => info!(
            "{}: {} locations and {} measurements inserted, {} records skipped",
            report.source,
            report.locations_inserted(),
            report.measurements_inserted(),
            record_failures
        ),
        Outcome::Aborted { reason } => warn!(
            "{}: stopped early ({}), {} locations and {} measurements committed",
            report.source,
            reason,
            report.locations_inserted(),
            report.measurements_inserted()
        ),
        Outcome::Failed { reason } => {
            error!("{}: nothing committed ({})", report.source, reason)
        }
    }

    Ok(())
}
