//! Trust-layer error types.

use crate::config::TrustPolicy;
use crate::fingerprint::{Fingerprint, HostPort};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a presented certificate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntrustedReason {
    /// No fingerprint is recorded for the target `host:port` and the policy
    /// does not pin on first use.
    UnknownHost,
    /// A fingerprint is recorded but the presented certificate digests to a
    /// different value.
    FingerprintMismatch {
        /// The pinned fingerprint.
        known: Fingerprint,
        /// What the peer presented.
        presented: Fingerprint,
    },
    /// The certificate did not chain to a configured CA root.
    CaValidation(String),
}

impl fmt::Display for UntrustedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UntrustedReason::UnknownHost => f.write_str("no fingerprint recorded for host"),
            UntrustedReason::FingerprintMismatch { known, presented } => write!(
                f,
                "fingerprint mismatch: known {known}, presented {presented}"
            ),
            UntrustedReason::CaValidation(reason) => {
                write!(f, "certificate not CA-valid: {reason}")
            }
        }
    }
}

/// Errors from trust configuration, the known-hosts store, and handshake
/// verification.
#[derive(Error, Debug)]
pub enum TrustError {
    /// The peer's certificate failed the configured trust policy. The
    /// handshake is aborted before any application data.
    #[error("untrusted peer {host_port}: {reason}")]
    UntrustedPeer {
        /// The authority the connection was addressed to.
        host_port: HostPort,
        /// Why it was rejected.
        reason: UntrustedReason,
    },

    /// A known-hosts line did not parse as `host:port fingerprint`.
    #[error("known-hosts file {path}: malformed entry at line {line}")]
    MalformedKnownHosts {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
    },

    /// A `host:port` text form did not parse.
    #[error("invalid host:port: {0}")]
    InvalidHostPort(String),

    /// A fingerprint text form was not hex.
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    /// The selected policy needs configuration that was not supplied.
    #[error("trust policy {policy} requires {missing}")]
    IncompleteConfig {
        /// The selected policy.
        policy: TrustPolicy,
        /// What is missing.
        missing: &'static str,
    },

    /// Certificate or key material could not be loaded or used.
    #[error("certificate material: {0}")]
    CertificateMaterial(String),

    /// Known-hosts file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
