//! Node configuration.
//!
//! The runtime consumes a finished [`NodeConfig`] value; everything here is
//! deserialized from one TOML file and validated before any component
//! starts.

use crate::error::NodeError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use url::Url;
use velum_directory::NodeId;
use velum_trust::TrustConfig;

fn default_pool_size() -> usize {
    20
}

fn default_sync_interval_secs() -> u64 {
    30
}

/// Complete configuration for one relay node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address the party-info listener binds to.
    pub listen: SocketAddr,
    /// URL other nodes should use to reach this one.
    pub advertised_url: Url,
    /// This node's public key, base64.
    pub node_key: String,
    /// Bootstrap peer URLs contacted before any directory entries exist.
    #[serde(default)]
    pub peers: Vec<Url>,
    /// Trust policy section.
    pub trust: TrustConfig,
    /// Cap on concurrently in-flight outbound requests.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Seconds between discovery push rounds.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
}

impl NodeConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let text = std::fs::read_to_string(path)?;
        let config: NodeConfig =
            toml::from_str(&text).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.pool_size == 0 {
            return Err(NodeError::Config("pool_size must be at least 1".into()));
        }
        if self.sync_interval_secs == 0 {
            return Err(NodeError::Config(
                "sync_interval_secs must be at least 1".into(),
            ));
        }
        if self.advertised_url.host_str().is_none() {
            return Err(NodeError::Config(
                "advertised_url must carry a host".into(),
            ));
        }
        self.node_id()?;
        Ok(())
    }

    /// The local node identity advertised in the directory.
    pub fn node_id(&self) -> Result<NodeId, NodeError> {
        NodeId::from_base64(&self.node_key)
            .map_err(|e| NodeError::Config(format!("node_key is not valid base64: {e}")))
    }

    /// Interval between discovery rounds.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }
}
