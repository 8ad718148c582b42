//! Wire-layer error types with stable error codes.
//!
//! Deserialization failures surface to HTTP clients as a structured JSON
//! body carrying one of the [`ErrorCode`] values, so callers can branch
//! programmatically instead of parsing a human string.

use crate::content::ContentType;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable error codes carried in HTTP error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed bytes declared as `application/json`.
    #[serde(rename = "OBJECT_JSON_DESERIALIZATION")]
    ObjectJsonDeserialization,
    /// Malformed bytes declared as `application/octet-stream`.
    #[serde(rename = "OBJECT_BINARY_DESERIALIZATION")]
    ObjectBinaryDeserialization,
}

impl ErrorCode {
    /// The wire form of this code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ObjectJsonDeserialization => "OBJECT_JSON_DESERIALIZATION",
            ErrorCode::ObjectBinaryDeserialization => "OBJECT_BINARY_DESERIALIZATION",
        }
    }

    /// The deserialization code for a given format.
    pub const fn deserialization(format: ContentType) -> Self {
        match format {
            ContentType::Json => ErrorCode::ObjectJsonDeserialization,
            ContentType::Binary => ErrorCode::ObjectBinaryDeserialization,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur encoding or decoding wire payloads.
#[derive(Error, Debug)]
pub enum WireError {
    /// The declared content type is not one this layer speaks.
    #[error("unsupported content type: {declared}")]
    UnsupportedContentType {
        /// The media type as declared by the peer.
        declared: String,
    },

    /// The bytes did not decode as the declared format.
    #[error("{code}: failed to decode {format} payload: {reason}")]
    Deserialization {
        /// Format the payload was declared as.
        format: ContentType,
        /// Stable code for the error body.
        code: ErrorCode,
        /// Decoder diagnostic.
        reason: String,
    },

    /// The value could not be encoded in the requested format.
    #[error("failed to encode {format} payload: {reason}")]
    Serialization {
        /// Requested format.
        format: ContentType,
        /// Encoder diagnostic.
        reason: String,
    },
}

impl WireError {
    /// The stable error code, when this error carries one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            WireError::Deserialization { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Structured error object returned in HTTP error response bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code.
    pub error: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

impl ErrorBody {
    /// Build an error body from a wire error, if it carries a stable code.
    pub fn from_wire_error(err: &WireError) -> Option<Self> {
        err.code().map(|code| ErrorBody {
            error: code,
            message: err.to_string(),
        })
    }
}
