//! Listener and router for the node-to-node surface.

use crate::error::NodeError;
use crate::handlers;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use velum_directory::ConcurrentNetworkNodes;

/// State shared across handlers: the process-wide directory, owned
/// explicitly and passed in at wiring time.
#[derive(Clone)]
pub struct AppState {
    /// The shared party-info directory.
    pub nodes: Arc<ConcurrentNetworkNodes>,
}

/// Build the node-to-node router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/partyinfo", post(handlers::party_info))
        .route("/upcheck", get(handlers::upcheck))
        .with_state(state)
}

/// Bind and serve until the shutdown signal flips.
pub async fn serve(
    listen: SocketAddr,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), NodeError> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| NodeError::Bind(format!("{listen}: {e}")))?;
    info!(addr = %listener.local_addr()?, "party-info endpoint listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;
    Ok(())
}
