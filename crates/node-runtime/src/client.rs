//! Outbound HTTP client wired to the trust policy.
//!
//! rustls verifiers are bound to one authority (`host:port`), so the
//! client keeps one preconfigured `reqwest::Client` per authority it has
//! talked to; connections are reused within an authority and every new
//! handshake runs the policy verifier before any request bytes are sent.
//!
//! `pool_size` caps concurrently in-flight requests across all
//! authorities: requests beyond the cap queue on a semaphore permit rather
//! than failing. Dropping a request future (caller timeout, shutdown)
//! cancels the underlying connection attempt and frees its slot.

use dashmap::DashMap;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;
use url::Url;
use velum_trust::{HostPort, TrustError, TrustManager};
use velum_wire::ContentType;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound request failures, split so callers can branch on security
/// failures versus ordinary transport trouble. HTTP-level error statuses
/// are not errors here; they come back as the response status.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The peer's certificate failed the trust policy. Never retried with
    /// relaxed trust.
    #[error("untrusted peer {authority}: {reason}")]
    UntrustedPeer {
        /// `host:port` of the rejected peer.
        authority: String,
        /// The trust layer's rejection.
        reason: String,
    },

    /// The request hit its timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Target URL.
        url: String,
    },

    /// Connection-level failure other than a trust rejection.
    #[error("transport failure for {url}: {reason}")]
    Transport {
        /// Target URL.
        url: String,
        /// Underlying failure.
        reason: String,
    },

    /// The peer URL cannot be turned into an authority to connect to.
    #[error("peer URL {url} is unusable: {reason}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Why it cannot be used.
        reason: &'static str,
    },

    /// Trust state could not produce a TLS config for this authority.
    #[error(transparent)]
    Trust(#[from] TrustError),
}

/// Trust-aware HTTP client shared by the discovery loop and any caller
/// that pushes party info.
pub struct NodeHttpClient {
    trust: Arc<TrustManager>,
    clients: DashMap<HostPort, reqwest::Client>,
    permits: Arc<Semaphore>,
    request_timeout: Duration,
}

impl NodeHttpClient {
    /// Build a client whose handshakes follow `trust`, with at most
    /// `pool_size` requests in flight.
    pub fn build(trust: Arc<TrustManager>, pool_size: usize) -> Self {
        Self {
            trust,
            clients: DashMap::new(),
            permits: Arc::new(Semaphore::new(pool_size)),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// POST a serialized directory snapshot to a peer's party-info
    /// endpoint, returning the response status and body.
    pub async fn post_party_info(
        &self,
        peer: &Url,
        format: ContentType,
        payload: Vec<u8>,
    ) -> Result<(StatusCode, Vec<u8>), ClientError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ClientError::Transport {
                url: peer.to_string(),
                reason: "client closed".into(),
            })?;

        let authority = authority_of(peer)?;
        let client = self.client_for(&authority)?;
        let endpoint = peer.join("/partyinfo").map_err(|_| ClientError::InvalidUrl {
            url: peer.to_string(),
            reason: "cannot address /partyinfo",
        })?;

        debug!(peer = %endpoint, %format, bytes = payload.len(), "pushing party info");
        let response = client
            .post(endpoint)
            .header(CONTENT_TYPE, format.header_value())
            .body(payload)
            .send()
            .await
            .map_err(|e| classify(peer, &authority, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(peer, &authority, e))?;
        Ok((status, body.to_vec()))
    }

    fn client_for(&self, authority: &HostPort) -> Result<reqwest::Client, ClientError> {
        if let Some(client) = self.clients.get(authority) {
            return Ok(client.clone());
        }
        let tls = self.trust.client_config_for(authority.clone())?;
        let built = reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                url: authority.to_string(),
                reason: e.to_string(),
            })?;
        Ok(self
            .clients
            .entry(authority.clone())
            .or_insert(built)
            .value()
            .clone())
    }
}

/// The `host:port` a URL addresses, with scheme-default ports filled in.
fn authority_of(url: &Url) -> Result<HostPort, ClientError> {
    let host = url.host_str().ok_or_else(|| ClientError::InvalidUrl {
        url: url.to_string(),
        reason: "no host",
    })?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: "no port",
        })?;
    Ok(HostPort::new(host, port))
}

/// Split transport failures into trust rejections, timeouts, and the rest.
fn classify(url: &Url, authority: &HostPort, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::Timeout {
            url: url.to_string(),
        };
    }
    if let Some(reason) = find_trust_rejection(&err) {
        return ClientError::UntrustedPeer {
            authority: authority.to_string(),
            reason,
        };
    }
    ClientError::Transport {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// Walk the error source chain for the trust layer's handshake rejection.
fn find_trust_rejection(err: &(dyn std::error::Error + 'static)) -> Option<String> {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = cause {
        if let Some(trust) = e.downcast_ref::<TrustError>() {
            return Some(trust.to_string());
        }
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            match tls {
                rustls::Error::Other(other) => return Some(other.0.to_string()),
                rustls::Error::InvalidCertificate(reason) => {
                    return Some(format!("invalid certificate: {reason:?}"))
                }
                _ => {}
            }
        }
        // Some layers box their causes in ways downcasting cannot see
        // through; the verifier's message text still identifies them.
        let text = e.to_string();
        if text.contains("untrusted peer") || text.contains("invalid peer certificate") {
            return Some(text);
        }
        cause = e.source();
    }
    None
}
