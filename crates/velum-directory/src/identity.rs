//! Node identity keys.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A node's public encryption key, used as the directory key.
///
/// This layer performs no cryptography on it: identities are opaque bytes
/// compared for equality, hashed, and serialized. On the wire an identity
/// is a base64 string so it can key a JSON map.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodeId(Vec<u8>);

impl NodeId {
    /// Wrap raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The underlying key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The wire (base64) form.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Parse the wire (base64) form.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        BASE64.decode(encoded).map(Self)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.to_base64())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        NodeId::from_base64(&encoded)
            .map_err(|e| D::Error::custom(format!("invalid base64 node id: {e}")))
    }
}
