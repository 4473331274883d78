//! HTTP API.
//!
//! | Method | Path            | Purpose                                   |
//! |--------|-----------------|-------------------------------------------|
//! | GET    | `/health`       | liveness probe                            |
//! | POST   | `/process-pdf/` | multipart upload → stamped PDF attachment |
//!
//! Handlers never parse PDFs on the async workers; the stamping core runs
//! under `spawn_blocking`.

pub mod error;
pub mod health;
pub mod process;

use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::{OverlayConfig, ServerConfig};

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub overlay: OverlayConfig,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(overlay: OverlayConfig, server: &ServerConfig) -> Self {
        Self {
            overlay,
            max_upload_bytes: server.max_upload_bytes,
        }
    }
}

/// Assemble the full router.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .merge(health::router())
        .merge(process::router())
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `server.bind_addr()` and serve until Ctrl-C or SIGTERM.
pub async fn serve(server: ServerConfig, overlay: OverlayConfig) -> std::io::Result<()> {
    let state = Arc::new(AppState::new(overlay, &server));
    let app = router(state);

    let listener = TcpListener::bind(server.bind_addr()).await?;
    info!("PDF overlay API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received, draining connections");
}
