//! # Stockroom Server
//!
//! Binary entry point: configuration, database, router, graceful shutdown.
//!
//! ```text
//! Browser / API client ───► HTTP (8500) ───► axum Router ───► SQLite
//!                                                 │
//!                                                 ▼
//!                                   Frankfurter rates / Google OAuth
//! ```

use anyhow::Context;
use stockroom_db::{Database, DbConfig};
use stockroom_web::{app, AppState, WebConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Stockroom server...");

    let config = WebConfig::load().context("failed to load configuration")?;
    info!(
        bind = %config.bind_addr,
        database = %config.database_path,
        algorithm = ?config.algorithm,
        token_minutes = config.access_token_expire_minutes,
        google_oauth = config.google.is_some(),
        "Configuration loaded"
    );

    let db_config = DbConfig::new(&config.database_path);
    if db_config.is_in_memory() {
        warn!("DATABASE_PATH is :memory:, data is lost on shutdown");
    }
    let db = Database::new(db_config)
        .await
        .context("failed to open database")?;
    info!("Database ready");

    let bind_addr = config.bind_addr;
    let state = AppState::from_config(db.clone(), config).context("failed to build HTTP client")?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "Listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise info, with debug for our own crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,stockroom=debug,stockroom_web=debug,stockroom_db=debug,sqlx=warn")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
