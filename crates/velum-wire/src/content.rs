//! Supported content types for node-to-node payloads.

use std::fmt;

/// The two wire formats a peer may declare for a party-info exchange.
///
/// Anything else is treated as an unrecognized route by the protocol
/// handler, not as a malformed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/json` - structured text.
    Json,
    /// `application/octet-stream` - compact binary (bincode).
    Binary,
}

impl ContentType {
    /// All supported formats, in preference order.
    pub const ALL: [ContentType; 2] = [ContentType::Binary, ContentType::Json];

    /// The value sent in `Content-Type` headers for this format.
    pub const fn header_value(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Binary => "application/octet-stream",
        }
    }

    /// Parse a declared media type into a supported format.
    ///
    /// Media type parameters (`; charset=...`) are ignored and matching is
    /// case-insensitive. Returns `None` for any type this layer does not
    /// speak.
    pub fn from_header(value: &str) -> Option<Self> {
        let media_type = value.split(';').next().unwrap_or("").trim();
        if media_type.eq_ignore_ascii_case("application/json") {
            Some(ContentType::Json)
        } else if media_type.eq_ignore_ascii_case("application/octet-stream") {
            Some(ContentType::Binary)
        } else {
            None
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_value())
    }
}
