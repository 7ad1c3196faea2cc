//! owc-collector - Open Weather Collector service
//!
//! Routes:
//! - POST /collect/                   start a job, stream its records
//! - GET  /progress/{user_defined_id}/ completion percentage of a job
//! - GET  /health

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use owc_collector::config::CollectionConfig;
use owc_collector::services::{CollectionOrchestrator, JobLocks, OpenWeatherClient};
use owc_collector::{build_router, AppState};
use owc_common::config::{default_config_path, prepare_root_folder, resolve_root_folder, TomlConfig};

/// Command-line arguments for owc-collector
#[derive(Parser, Debug)]
#[command(name = "owc-collector")]
#[command(about = "Collects current weather for a configured city set in paced waves")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "OWC_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding owc.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:5730", env = "OWC_BIND")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);

    // The log level lives in the TOML file; report its loading at info
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    let toml_config =
        tracing::subscriber::with_default(bootstrap, || TomlConfig::load(&config_path))?;

    // RUST_LOG overrides the TOML level
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("{},tower_http=info", toml_config.logging.level).into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting owc-collector v{} (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );

    let collection_config = Arc::new(
        CollectionConfig::from_toml(&toml_config).context("Invalid collector configuration")?,
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = prepare_root_folder(&root_folder)?;
    info!("Database: {}", db_path.display());

    let db_pool = owc_collector::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let client = OpenWeatherClient::new(
        collection_config.base_url.clone(),
        collection_config.api_key.clone(),
        collection_config.request_timeout,
    )
    .map_err(|e| anyhow::anyhow!("Failed to build upstream client: {}", e))?;

    let orchestrator = CollectionOrchestrator::new(
        db_pool.clone(),
        Arc::new(client),
        collection_config,
        JobLocks::new(),
    );

    let app = build_router(AppState::new(db_pool, orchestrator));

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!("Listening on http://{}", args.bind);
    info!("Health check: http://{}/health", args.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
