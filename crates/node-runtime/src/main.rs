//! # Velum Relay Node
//!
//! Entry point for one relay node.
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber
//! 2. Load and validate configuration (first CLI argument, default
//!    `velum.toml`)
//! 3. Build the shared directory and advertise the local node in it
//! 4. Load trust state (known hosts, CA roots, client credentials)
//! 5. Spawn the party-info listener and the discovery loop
//! 6. Run until ctrl-c, then signal both tasks to stop

use anyhow::{Context, Result};
use node_runtime::{AppState, Discovery, NodeConfig, NodeHttpClient};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;
use velum_directory::ConcurrentNetworkNodes;
use velum_trust::TrustManager;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "velum.toml".to_string());
    let config = NodeConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;
    info!(
        listen = %config.listen,
        advertised = %config.advertised_url,
        policy = %config.trust.policy,
        "starting velum node"
    );

    let nodes = Arc::new(ConcurrentNetworkNodes::new(config.advertised_url.clone()));
    nodes.add_node(config.node_id()?, config.advertised_url.clone());

    let trust = Arc::new(TrustManager::new(&config.trust).context("loading trust state")?);
    let client = Arc::new(NodeHttpClient::build(trust, config.pool_size));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let discovery = Discovery::new(
        Arc::clone(&nodes),
        client,
        config.sync_interval(),
        config.peers.clone(),
    );
    let discovery_task = tokio::spawn(discovery.run(shutdown_rx.clone()));

    let state = AppState {
        nodes: Arc::clone(&nodes),
    };
    let server_task = tokio::spawn(node_runtime::serve(config.listen, state, shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = discovery_task.await;
    server_task
        .await
        .context("server task panicked")?
        .context("server failed")?;

    info!("node stopped");
    Ok(())
}
