//! reel-catalog - Movie catalog service
//!
//! Serves the catalog JSON API and runs the background TMDB bulk import.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reel_common::config::{self as common_config, ROOT_FOLDER_ENV};
use reel_common::events::EventBus;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reel_catalog::config::ServiceSettings;
use reel_catalog::AppState;

/// Default HTTP port
const DEFAULT_PORT: u16 = 5730;

#[derive(Debug, Parser)]
#[command(name = "reel-catalog", version, about = "Movie catalog service with TMDB bulk import")]
struct Args {
    /// HTTP port to listen on
    #[arg(long, env = "REEL_PORT")]
    port: Option<u16>,

    /// Folder holding the catalog database
    #[arg(long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load movies from a CSV file into the catalog, then exit
    SeedCsv {
        /// CSV file with a title,year,box_office,director,producer,cast,poster_url header
        path: PathBuf,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "reel_catalog={0},reel_common={0},tower_http={0}",
            level
        ))
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = common_config::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(&toml_config.logging.level);

    info!("Starting reel-catalog v{}", env!("CARGO_PKG_VERSION"));

    // CLI/env already merged by clap; the resolver adds TOML and OS default
    let root_folder =
        common_config::resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml_config);
    let db_path = common_config::prepare_root_folder(&root_folder)
        .with_context(|| format!("Failed to initialize root folder {}", root_folder.display()))?;
    info!("Database: {}", db_path.display());

    let db_pool = reel_catalog::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    if let Some(Command::SeedCsv { path }) = &args.command {
        let report = reel_catalog::db::seed::seed_from_csv_file(&db_pool, path)
            .await
            .with_context(|| format!("Failed to seed catalog from {}", path.display()))?;
        info!(
            "Seeded {} movies ({} rows skipped)",
            report.inserted, report.skipped
        );
        return Ok(());
    }

    let event_bus = EventBus::new(100);

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let state = AppState::new(db_pool, event_bus, ServiceSettings::new(toml_config));
    let app = reel_catalog::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("reel-catalog stopped");
    Ok(())
}
