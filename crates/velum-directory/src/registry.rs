//! The concurrent party-info registry and its merge semantics.

use crate::identity::NodeId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Thread-safe directory of peers: node identity -> reachable URL, plus the
/// local node's own advertised URL.
///
/// Readers and writers need no external locking; the map synchronizes
/// internally. Merging is the union of entries with a remote-wins
/// tie-break: on key collision the incoming snapshot's URL replaces the
/// local one, so the directory converges on whichever peer was contacted
/// most recently. The directory is a reachability hint, not a
/// consistency-critical record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrentNetworkNodes {
    self_url: Url,
    nodes: DashMap<NodeId, Url>,
}

impl ConcurrentNetworkNodes {
    /// Create an empty directory advertising `self_url`.
    pub fn new(self_url: Url) -> Self {
        Self {
            self_url,
            nodes: DashMap::new(),
        }
    }

    /// The local node's advertised URL.
    pub fn url(&self) -> &Url {
        &self.self_url
    }

    /// Insert or overwrite the URL recorded for `id`.
    ///
    /// Safe to call concurrently; repeating a call with identical arguments
    /// leaves the directory unchanged.
    pub fn add_node(&self, id: NodeId, url: Url) {
        self.nodes.insert(id, url);
    }

    /// The URL recorded for `id`, if any.
    pub fn node_url(&self, id: &NodeId) -> Option<Url> {
        self.nodes.get(id).map(|entry| entry.value().clone())
    }

    /// Number of directory entries.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the directory has no entries.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A point-in-time copy of all entries.
    pub fn snapshot(&self) -> Vec<(NodeId, Url)> {
        self.nodes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Merge a remote snapshot into this directory in place.
    ///
    /// The result contains the union of both entry sets; on key collision
    /// the remote entry wins. Merging the same snapshot repeatedly is
    /// idempotent. Merging two *different* snapshots is order-sensitive
    /// because of the remote-wins tie-break: `a.merge(b)` and `b.merge(a)`
    /// may record different URLs for a shared key.
    pub fn merge(&self, remote: &ConcurrentNetworkNodes) {
        for entry in remote.nodes.iter() {
            self.nodes.insert(entry.key().clone(), entry.value().clone());
        }
    }
}

/// Two directories are equal iff their advertised URL and full key->url
/// mapping agree; entry order is irrelevant.
impl PartialEq for ConcurrentNetworkNodes {
    fn eq(&self, other: &Self) -> bool {
        if self.self_url != other.self_url || self.nodes.len() != other.nodes.len() {
            return false;
        }
        self.nodes.iter().all(|entry| {
            other
                .nodes
                .get(entry.key())
                .is_some_and(|url| *url == *entry.value())
        })
    }
}

impl Eq for ConcurrentNetworkNodes {}
