//! Trust configuration values.
//!
//! A [`TrustConfig`] is produced by the external configuration layer and is
//! read-only afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The closed set of trust strategies for outbound TLS connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustPolicy {
    /// Accept any certificate.
    Insecure,
    /// Accept only certificates whose fingerprint is already recorded for
    /// the target `host:port`.
    Whitelist,
    /// Accept certificates chaining to a configured CA root.
    Ca,
    /// Trust-on-first-use: pin the first certificate seen per `host:port`,
    /// reject later mismatches.
    Tofu,
    /// CA validation, falling back to the tofu rule.
    CaOrTofu,
    /// CA validation, falling back to the whitelist rule.
    CaOrWhitelist,
}

impl TrustPolicy {
    /// The configuration name of this policy.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TrustPolicy::Insecure => "insecure",
            TrustPolicy::Whitelist => "whitelist",
            TrustPolicy::Ca => "ca",
            TrustPolicy::Tofu => "tofu",
            TrustPolicy::CaOrTofu => "ca-or-tofu",
            TrustPolicy::CaOrWhitelist => "ca-or-whitelist",
        }
    }

    /// Whether this policy needs a CA root bundle.
    pub const fn requires_ca_roots(&self) -> bool {
        matches!(
            self,
            TrustPolicy::Ca | TrustPolicy::CaOrTofu | TrustPolicy::CaOrWhitelist
        )
    }
}

impl fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insecure" => Ok(TrustPolicy::Insecure),
            "whitelist" => Ok(TrustPolicy::Whitelist),
            "ca" => Ok(TrustPolicy::Ca),
            "tofu" => Ok(TrustPolicy::Tofu),
            "ca-or-tofu" => Ok(TrustPolicy::CaOrTofu),
            "ca-or-whitelist" => Ok(TrustPolicy::CaOrWhitelist),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Error for a policy name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trust policy: {0}")]
pub struct UnknownPolicy(pub String);

/// Immutable inputs for the trust layer, selected once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Which strategy decides certificate acceptance.
    pub policy: TrustPolicy,
    /// Path of the persisted known-hosts file (whitelist reads, tofu
    /// appends).
    pub known_hosts: PathBuf,
    /// PEM bundle of CA roots for the `ca*` policies.
    #[serde(default)]
    pub ca_bundle: Option<PathBuf>,
    /// PEM client certificate chain presented to peers, if any.
    #[serde(default)]
    pub client_cert: Option<PathBuf>,
    /// PEM private key matching `client_cert`.
    #[serde(default)]
    pub client_key: Option<PathBuf>,
}

impl TrustConfig {
    /// A config with only a policy and a known-hosts path.
    pub fn new(policy: TrustPolicy, known_hosts: impl Into<PathBuf>) -> Self {
        Self {
            policy,
            known_hosts: known_hosts.into(),
            ca_bundle: None,
            client_cert: None,
            client_key: None,
        }
    }
}
