//! Runtime-level error types.

use thiserror::Error;
use velum_trust::TrustError;

/// Errors raised while configuring or running a node.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(String),

    /// The listener could not be bound.
    #[error("server bind error: {0}")]
    Bind(String),

    /// Trust state could not be loaded.
    #[error("trust error: {0}")]
    Trust(#[from] TrustError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
