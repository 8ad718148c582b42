//! Certificate fingerprints and the `host:port` keys they are pinned under.

use crate::error::TrustError;
use sha2::{Digest, Sha256};
use std::fmt;

/// A network authority: the `host:port` a connection is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPort {
    /// Hostname or IP literal.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl HostPort {
    /// Build from parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse the `host:port` text form used in the known-hosts file.
    pub fn parse(text: &str) -> Result<Self, TrustError> {
        let (host, port) = text
            .rsplit_once(':')
            .ok_or_else(|| TrustError::InvalidHostPort(text.to_string()))?;
        if host.is_empty() {
            return Err(TrustError::InvalidHostPort(text.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| TrustError::InvalidHostPort(text.to_string()))?;
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Hex-encoded SHA-256 digest of a DER-encoded certificate.
///
/// Stored lowercase; parsing accepts either case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest a DER-encoded certificate.
    pub fn of_der(der: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(der)))
    }

    /// Parse the hex text form from a known-hosts entry.
    pub fn parse(text: &str) -> Result<Self, TrustError> {
        let normalized = text.to_ascii_lowercase();
        if normalized.is_empty() || !normalized.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TrustError::InvalidFingerprint(text.to_string()));
        }
        Ok(Self(normalized))
    }

    /// The lowercase hex form.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
