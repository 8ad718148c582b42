//! # Velum Wire Formats
//!
//! Encoding and decoding of node-to-node payloads in the two interchangeable
//! wire formats spoken between relay nodes:
//!
//! - `application/json` - human-readable, used for debugging and tooling
//! - `application/octet-stream` - compact binary (bincode), the default for
//!   peer-to-peer exchanges
//!
//! All format-specific logic lives here; protocol and registry code select a
//! [`ContentType`] and call [`serialize`] / [`deserialize`] without knowing
//! which codec backs it. The format registry is a closed enum dispatched by
//! `match` - adding a format means adding a variant, not reflection.

pub mod content;
pub mod error;
pub mod serializer;

pub use content::ContentType;
pub use error::{ErrorBody, ErrorCode, WireError};
pub use serializer::{deserialize, round_trip, serialize};
