//! roster-server - user roster HTTP backend
//!
//! Startup: tracing → configuration → database → department directory →
//! HTTP server. Any failure before the server binds aborts the process.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use roster_common::config::{ConfigOverrides, RosterConfig};
use roster_common::db::{check_connectivity, init_database};
use roster_server::{build_router, AppState, DepartmentDirectory};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for roster-server
#[derive(Parser, Debug)]
#[command(name = "roster-server")]
#[command(about = "User roster backend: CSV import, user and department APIs")]
#[command(version)]
struct Args {
    /// SQLite database file
    #[arg(long, env = "DB_PATH")]
    db_path: Option<PathBuf>,

    /// Host to bind
    #[arg(long, env = "ROSTER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "ROSTER_PORT")]
    port: Option<u16>,

    /// Maximum upload body size in bytes
    #[arg(long, env = "ROSTER_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// TOML config file (defaults to ~/.config/roster/config.toml)
    #[arg(short, long, env = "ROSTER_CONFIG")]
    config: Option<PathBuf>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            db_path: args.db_path,
            host: args.host,
            port: args.port,
            max_upload_bytes: args.max_upload_bytes,
            config_file: args.config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may set RUST_LOG, so it is read before the filter is built
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster_server=info,roster_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting roster-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(_) => info!("No .env file found, assuming environment variables are set"),
    }

    let args = Args::parse();
    let config = RosterConfig::resolve(args.into()).context("Failed to resolve configuration")?;
    info!("Database path: {}", config.db_path.display());

    let pool = init_database(&config.db_path)
        .await
        .context("Failed to open database")?;
    check_connectivity(&pool)
        .await
        .context("Database connectivity check failed")?;
    info!("✓ Connected to database");

    let directory = DepartmentDirectory::load(&pool)
        .await
        .context("Failed to load department directory")?;
    if directory.is_empty() {
        warn!("No active departments found; every import row will be rejected");
    }

    let state = AppState::new(pool, directory).with_max_upload_bytes(config.max_upload_bytes);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    info!("roster-server listening on http://{}:{}", config.host, config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("roster-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
