//! musiclib-web - music catalog HTTP service
//!
//! Resolves the root folder, opens (or creates) the catalog database and
//! serves the JSON API until Ctrl+C or SIGTERM.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use musiclib_common::config::{
    load_toml_config, resolve_bind_address, resolve_port, RootFolderInitializer, RootFolderResolver, ROOT_FOLDER_ENV,
};
use musiclib_common::db::init_database;
use musiclib_web::{build_router, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for musiclib-web
#[derive(Parser, Debug)]
#[command(name = "musiclib-web")]
#[command(about = "Music catalog web service")]
#[command(version)]
struct Args {
    /// Root folder holding the database and uploaded media
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// Port to listen on (falls back to MUSICLIB_PORT, then the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config problems are reported through a stderr subscriber that only lives
    // for the load; the real one needs the configured level first
    let config = tracing::subscriber::with_default(
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .finish(),
        || load_toml_config(args.config.as_deref()),
    );

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting musiclib-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new(args.root_folder.clone(), &config).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .with_context(|| format!("Failed to create root folder {}", initializer.root().display()))?;
    info!("Root folder: {}", initializer.root().display());

    let db_path = initializer.database_path();
    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database {}: {}", db_path.display(), e);
            return Err(e).context("Database initialization failed");
        }
    };

    let state = AppState::new(pool.clone(), initializer.media_path());
    let app = build_router(state);

    let addr = format!(
        "{}:{}",
        resolve_bind_address(args.bind.as_deref(), &config),
        resolve_port(args.port, &config)
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("musiclib-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
