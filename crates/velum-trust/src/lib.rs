//! # Velum Trust
//!
//! Pluggable TLS trust for node-to-node connections. A [`TrustManager`] is
//! built once from the node configuration and hands out per-authority
//! rustls client configs whose certificate verification follows the
//! configured [`TrustPolicy`]:
//!
//! | policy            | accept condition                                      |
//! |-------------------|-------------------------------------------------------|
//! | `insecure`        | always                                                |
//! | `whitelist`       | fingerprint pinned in known-hosts matches             |
//! | `ca`              | chains to a configured CA root                        |
//! | `tofu`            | first contact pins, later contacts must match         |
//! | `ca-or-tofu`      | CA-valid, else the tofu rule                          |
//! | `ca-or-whitelist` | CA-valid, else the whitelist rule                     |
//!
//! A rejected handshake aborts before any application data and surfaces as
//! [`TrustError::UntrustedPeer`], distinguishable from ordinary transport
//! failures. There is no fallback to plaintext and no retry with a relaxed
//! policy.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod known_hosts;
pub mod verifier;

pub use config::{TrustConfig, TrustPolicy};
pub use error::{TrustError, UntrustedReason};
pub use fingerprint::{Fingerprint, HostPort};
pub use known_hosts::KnownHostsStore;
pub use verifier::{PolicyVerifier, TrustManager};
