//! # Velum Directory
//!
//! The shared party-info directory: a thread-safe mapping from node
//! identity (public key) to reachable URL, exchanged and merged between
//! peers. One [`ConcurrentNetworkNodes`] instance is created at startup
//! with the local node's advertised URL and lives for the process; every
//! successful inbound or outbound party-info exchange merges into it.

pub mod identity;
pub mod registry;

pub use identity::NodeId;
pub use registry::ConcurrentNetworkNodes;
