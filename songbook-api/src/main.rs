//! songbook-api - song library HTTP service
//!
//! Resolves configuration (CLI > ENV > TOML > defaults), opens the SQLite
//! pool, and serves the API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use songbook_api::cli::Args;
use songbook_api::{build_router, AppState};
use songbook_common::config::{Config, ConfigOverrides};
use songbook_common::db::init_database;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    let config = Config::resolve(ConfigOverrides::from(args))
        .context("Failed to resolve configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    // Build identification first, before any store delay
    info!(
        "Starting songbook-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    info!("Database path: {}", config.database.path.display());
    let pool = match init_database(&config.database).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(pool.clone(), config.database.query_timeout);
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("songbook-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    pool.close().await;
    info!("Server shutdown complete");
    served
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
