use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod db;
mod http;
mod logging;
mod pipeline;
mod query;
mod s3;
mod scheduler;
#[cfg(test)]
mod test_utils;

use crate::db::PostgresDatabase;
use crate::pipeline::{IngestionPipeline, RunOutcome};
use crate::query::QueryService;
use crate::s3::S3Storage;

type Pipeline = IngestionPipeline<S3Storage, PostgresDatabase>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.toml",
        global = true
    )]
    config: String,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API and process the source bucket every 10 minutes
    Serve,
    /// Run a single ingestion pass
    Process,
    /// Empty the snapshot and the users table
    Reset,
    /// Upload a local directory into the source bucket
    UploadDir {
        /// Directory whose files become source objects
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {:#}", cli.config, e);
            process::exit(1);
        }
    };

    let _log_guard = logging::init_logging(config.logging.as_ref(), cli.verbose)?;
    info!("Profile sync v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from: {}", cli.config);

    let result = match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Process => process_once(config).await,
        Commands::Reset => reset(config).await,
        Commands::UploadDir { path } => upload_dir(config, path).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn serve(config: config::Config) -> Result<()> {
    let (pipeline, database) = initialize_pipeline(&config).await?;

    let _scheduler =
        scheduler::spawn_periodic_processing(pipeline.clone(), scheduler::PROCESS_INTERVAL);

    let app = http::router(http::AppState {
        pipeline,
        query: Arc::new(QueryService::new(database)),
    });

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, app)
        .await
        .context("HTTP server stopped")?;
    Ok(())
}

async fn process_once(config: config::Config) -> Result<()> {
    let (pipeline, _) = initialize_pipeline(&config).await?;

    match pipeline.process().await? {
        RunOutcome::Completed(summary) => info!(
            "Ingested {} users; snapshot holds {} users",
            summary.users_ingested, summary.snapshot_users
        ),
        RunOutcome::Rejected(reason) => {
            anyhow::bail!("Source files rejected, nothing was written: {}", reason)
        }
        RunOutcome::Skipped => info!("Another run is in progress"),
    }
    Ok(())
}

async fn reset(config: config::Config) -> Result<()> {
    let (pipeline, _) = initialize_pipeline(&config).await?;

    info!("Resetting snapshot and users table...");
    pipeline.reset().await?;
    info!("Reset complete");
    Ok(())
}

async fn upload_dir(config: config::Config, path: PathBuf) -> Result<()> {
    let storage = S3Storage::new(&config.s3).await?;
    let keys = s3::upload_directory(&storage, &config.s3.source_bucket, &path)
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;
    info!("Uploaded {} files", keys.len());
    Ok(())
}

async fn initialize_pipeline(
    config: &config::Config,
) -> Result<(Arc<Pipeline>, Arc<PostgresDatabase>)> {
    let database = Arc::new(
        PostgresDatabase::new(&config.database.url, config.database.max_connections).await?,
    );
    let storage = Arc::new(S3Storage::new(&config.s3).await?);
    let pipeline = Arc::new(IngestionPipeline::new(
        storage,
        database.clone(),
        &config.s3.source_bucket,
        &config.s3.processed_bucket,
    ));

    pipeline
        .bootstrap()
        .await
        .context("Failed to prepare buckets, snapshot and users table")?;
    info!("Pipeline initialized successfully");

    Ok((pipeline, database))
}
