//! Timer-driven directory synchronization with known peers.
//!
//! Each round snapshots the local directory, pushes it to every reachable
//! peer URL, and merges whatever directory each peer answers with. A push
//! that fails or times out merges nothing; the next round retries it. The
//! merge happens only after a complete, successful decode of the peer's
//! response, so a cancelled exchange can never leave partial state behind.

use crate::client::NodeHttpClient;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use url::Url;
use velum_directory::ConcurrentNetworkNodes;
use velum_wire::ContentType;

/// The outbound half of the party-info protocol.
pub struct Discovery {
    nodes: Arc<ConcurrentNetworkNodes>,
    client: Arc<NodeHttpClient>,
    interval: Duration,
    bootstrap: Vec<Url>,
}

impl Discovery {
    /// Build a discovery task over the shared directory.
    ///
    /// `bootstrap` peers are contacted every round in addition to
    /// directory entries, so a cold node with an empty directory can still
    /// find the network.
    pub fn new(
        nodes: Arc<ConcurrentNetworkNodes>,
        client: Arc<NodeHttpClient>,
        interval: Duration,
        bootstrap: Vec<Url>,
    ) -> Self {
        Self {
            nodes,
            client,
            interval,
            bootstrap,
        }
    }

    /// Run rounds until the shutdown signal flips. An in-flight round is
    /// dropped on shutdown; the directory stays consistent because merges
    /// are all-or-nothing.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "discovery started");
        loop {
            tokio::select! {
                _ = ticker.tick() => self.push_round().await,
                _ = shutdown.changed() => {
                    info!("discovery stopping");
                    return;
                }
            }
        }
    }

    /// The peer URLs to contact this round: bootstrap peers plus every
    /// directory entry, minus our own advertised URL.
    fn targets(&self) -> HashSet<Url> {
        self.bootstrap
            .iter()
            .cloned()
            .chain(self.nodes.snapshot().into_iter().map(|(_, url)| url))
            .filter(|url| url != self.nodes.url())
            .collect()
    }

    async fn push_round(&self) {
        let payload = match velum_wire::serialize(ContentType::Binary, &*self.nodes) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, "failed to encode local party info");
                return;
            }
        };

        for url in self.targets() {
            match self
                .client
                .post_party_info(&url, ContentType::Binary, payload.clone())
                .await
            {
                Ok((status, body)) if status.is_success() => {
                    match velum_wire::deserialize::<ConcurrentNetworkNodes>(
                        ContentType::Binary,
                        &body,
                    ) {
                        Ok(remote) => {
                            self.nodes.merge(&remote);
                            debug!(peer = %url, entries = remote.len(), "merged party info");
                        }
                        Err(err) => {
                            warn!(peer = %url, error = %err, "peer answered undecodable party info")
                        }
                    }
                }
                Ok((status, _)) => warn!(peer = %url, %status, "party info push rejected"),
                Err(err) => warn!(peer = %url, error = %err, "party info push failed"),
            }
        }
    }
}
