//! Process bootstrap: adapter, data store, seed, HTTP.
//!
//! The adapter handle is acquired in [`run`] and released there on every
//! exit path, after the HTTP server has stopped.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use crate::api::{self, CookieDraftMode};
use crate::config::Settings;
use crate::db::{AdapterHandle, Database};
use crate::seed;
use crate::AppState;

/// Create the adapter, open the data store and run migrations.
pub async fn open_database(handle: &AdapterHandle) -> Result<Database> {
    let (descriptor, db) = handle.open_database().await?;
    tracing::info!(adapter = %descriptor.describe(), "Database adapter ready");

    db.run_migrations()
        .await
        .context("Failed to prepare database schema")?;
    Ok(db)
}

pub async fn run(settings: Settings) -> Result<()> {
    let handle = AdapterHandle::from_settings(settings.clone());
    run_with(&handle, &settings).await
}

/// Serve on `handle` until shutdown; the handle is shut down on every exit path.
pub async fn run_with(handle: &AdapterHandle, settings: &Settings) -> Result<()> {
    let result = serve(handle, settings).await;
    handle.shutdown().await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{:#}", e), "Server stopped with an error");
    }
    result
}

async fn serve(handle: &AdapterHandle, settings: &Settings) -> Result<()> {
    let db = open_database(handle).await?;
    seed::seed_defaults(&db, settings).await;
    db.log_pool_metrics();

    let state = Arc::new(AppState {
        db: db.clone(),
        draft_mode: Arc::new(CookieDraftMode::new(settings.draft_cookie_name.clone())),
    });
    let app = api::router(state);

    let served = async {
        let listener = TcpListener::bind(&settings.bind_address)
            .await
            .with_context(|| format!("Failed to bind {}", settings.bind_address))?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")
    }
    .await;

    db.close().await;
    tracing::info!("Server shutdown complete");
    served
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
