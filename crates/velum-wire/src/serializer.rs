//! Format-dispatched encode/decode.
//!
//! Pure functions over well-formed inputs: a failed decode never leaves a
//! partially-written target behind, because decoding always builds a fresh
//! value.

use crate::content::ContentType;
use crate::error::{ErrorCode, WireError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value in the given wire format.
pub fn serialize<T: Serialize>(format: ContentType, value: &T) -> Result<Vec<u8>, WireError> {
    match format {
        ContentType::Json => serde_json::to_vec(value).map_err(|e| WireError::Serialization {
            format,
            reason: e.to_string(),
        }),
        ContentType::Binary => bincode::serialize(value).map_err(|e| WireError::Serialization {
            format,
            reason: e.to_string(),
        }),
    }
}

/// Decode a value from the given wire format.
///
/// Malformed bytes yield [`WireError::Deserialization`] with the stable
/// code for `format`.
pub fn deserialize<T: DeserializeOwned>(
    format: ContentType,
    bytes: &[u8],
) -> Result<T, WireError> {
    match format {
        ContentType::Json => {
            serde_json::from_slice(bytes).map_err(|e| WireError::Deserialization {
                format,
                code: ErrorCode::deserialization(format),
                reason: e.to_string(),
            })
        }
        ContentType::Binary => {
            bincode::deserialize(bytes).map_err(|e| WireError::Deserialization {
                format,
                code: ErrorCode::deserialization(format),
                reason: e.to_string(),
            })
        }
    }
}

/// Encode then decode a value, returning the reconstruction.
///
/// For every representable value `v`, `round_trip(format, &v) == v` in both
/// formats; format choice is not observable in the result's equality.
pub fn round_trip<T: Serialize + DeserializeOwned>(
    format: ContentType,
    value: &T,
) -> Result<T, WireError> {
    deserialize(format, &serialize(format, value)?)
}
