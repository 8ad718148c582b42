//! # Velum Node Runtime
//!
//! Runs one relay node: every peer is simultaneously a server exposing the
//! party-info endpoint and a client pushing its own directory snapshot to
//! the peers it knows about.
//!
//! ## Structure
//!
//! - `config` - TOML node configuration and validation
//! - `server` - axum listener and router (`POST /partyinfo`, `GET /upcheck`)
//! - `handlers` - the party-info exchange state machine
//! - `client` - outbound HTTPS client wired to the trust policy
//! - `discovery` - timer-driven push/merge loop against known peers
//!
//! The shared [`velum_directory::ConcurrentNetworkNodes`] instance is
//! created once in `main` and handed to the server and the discovery task
//! as an explicit `Arc` - there is no global registry.

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod handlers;
pub mod server;

pub use client::{ClientError, NodeHttpClient};
pub use config::NodeConfig;
pub use discovery::Discovery;
pub use error::NodeError;
pub use server::{build_router, serve, AppState};
