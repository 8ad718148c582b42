//! Policy-driven certificate verification for outbound handshakes.
//!
//! A [`TrustManager`] is built once from the [`TrustConfig`] and loads the
//! known-hosts file, CA roots, and client credentials. rustls verifiers see
//! only the server name during a handshake, not the port, so the manager
//! hands out a [`PolicyVerifier`] bound to one `host:port` at a time; the
//! client layer builds (and caches) one TLS config per authority.

use crate::config::{TrustConfig, TrustPolicy};
use crate::error::{TrustError, UntrustedReason};
use crate::fingerprint::{Fingerprint, HostPort};
use crate::known_hosts::KnownHostsStore;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, OtherError, RootCertStore, SignatureScheme};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::PrivateKeyDer;
use std::sync::Arc;
use tracing::debug;

/// Client certificate chain and key presented to peers.
struct ClientAuth {
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

/// Owns the trust state shared across all outbound connections.
pub struct TrustManager {
    policy: TrustPolicy,
    store: Arc<KnownHostsStore>,
    ca_verifier: Option<Arc<WebPkiServerVerifier>>,
    client_auth: Option<ClientAuth>,
    supported: WebPkiSupportedAlgorithms,
}

impl TrustManager {
    /// Load trust state per the configuration.
    ///
    /// Fails when the `ca*` policies lack a CA bundle, when certificate
    /// material does not parse, or when the known-hosts file is malformed.
    pub fn new(config: &TrustConfig) -> Result<Self, TrustError> {
        let store = Arc::new(KnownHostsStore::load(&config.known_hosts)?);

        let ca_verifier = if config.policy.requires_ca_roots() {
            let bundle = config
                .ca_bundle
                .as_ref()
                .ok_or(TrustError::IncompleteConfig {
                    policy: config.policy,
                    missing: "a CA bundle path",
                })?;
            Some(Self::build_ca_verifier(bundle)?)
        } else {
            None
        };

        let client_auth = match (&config.client_cert, &config.client_key) {
            (Some(cert), Some(key)) => {
                let chain = CertificateDer::pem_file_iter(cert)
                    .map_err(|e| TrustError::CertificateMaterial(e.to_string()))?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| TrustError::CertificateMaterial(e.to_string()))?;
                let key = PrivateKeyDer::from_pem_file(key)
                    .map_err(|e| TrustError::CertificateMaterial(e.to_string()))?;
                Some(ClientAuth { chain, key })
            }
            (None, None) => None,
            _ => {
                return Err(TrustError::CertificateMaterial(
                    "client certificate and key must be configured together".into(),
                ))
            }
        };

        Ok(Self {
            policy: config.policy,
            store,
            ca_verifier,
            client_auth,
            supported: rustls::crypto::ring::default_provider().signature_verification_algorithms,
        })
    }

    fn build_ca_verifier(bundle: &std::path::Path) -> Result<Arc<WebPkiServerVerifier>, TrustError> {
        let mut roots = RootCertStore::empty();
        for cert in CertificateDer::pem_file_iter(bundle)
            .map_err(|e| TrustError::CertificateMaterial(e.to_string()))?
        {
            let cert = cert.map_err(|e| TrustError::CertificateMaterial(e.to_string()))?;
            roots
                .add(cert)
                .map_err(|e| TrustError::CertificateMaterial(e.to_string()))?;
        }
        if roots.is_empty() {
            return Err(TrustError::CertificateMaterial(
                "CA bundle contains no certificates".into(),
            ));
        }
        WebPkiServerVerifier::builder_with_provider(
            Arc::new(roots),
            Arc::new(rustls::crypto::ring::default_provider()),
        )
        .build()
        .map_err(|e| TrustError::CertificateMaterial(e.to_string()))
    }

    /// The configured policy.
    pub fn policy(&self) -> TrustPolicy {
        self.policy
    }

    /// The shared known-hosts store.
    pub fn known_hosts(&self) -> Arc<KnownHostsStore> {
        Arc::clone(&self.store)
    }

    /// A certificate verifier bound to one authority.
    pub fn verifier_for(&self, host_port: HostPort) -> Arc<PolicyVerifier> {
        Arc::new(PolicyVerifier {
            policy: self.policy,
            host_port,
            store: Arc::clone(&self.store),
            ca_verifier: self.ca_verifier.clone(),
            supported: self.supported,
        })
    }

    /// A complete rustls client config for connections to one authority,
    /// carrying the policy verifier and any configured client credentials.
    pub fn client_config_for(&self, host_port: HostPort) -> Result<rustls::ClientConfig, TrustError> {
        debug!(authority = %host_port, policy = %self.policy, "building client TLS config");
        let builder = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(self.verifier_for(host_port));

        let config = match &self.client_auth {
            Some(auth) => builder
                .with_client_auth_cert(auth.chain.clone(), auth.key.clone_key())
                .map_err(|e| TrustError::CertificateMaterial(e.to_string()))?,
            None => builder.with_no_client_auth(),
        };
        Ok(config)
    }
}

impl std::fmt::Debug for TrustManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustManager")
            .field("policy", &self.policy)
            .field("store", &self.store)
            .finish()
    }
}

/// Certificate verifier for a single `host:port`, dispatching on the
/// configured [`TrustPolicy`].
#[derive(Debug)]
pub struct PolicyVerifier {
    policy: TrustPolicy,
    host_port: HostPort,
    store: Arc<KnownHostsStore>,
    ca_verifier: Option<Arc<WebPkiServerVerifier>>,
    supported: WebPkiSupportedAlgorithms,
}

impl PolicyVerifier {
    fn reject(&self, reason: UntrustedReason) -> rustls::Error {
        rustls::Error::Other(OtherError(Arc::new(TrustError::UntrustedPeer {
            host_port: self.host_port.clone(),
            reason,
        })))
    }

    /// The whitelist / tofu rule. `pin_unknown` is the tofu behavior:
    /// an unknown host is accepted and its fingerprint persisted.
    fn check_pinned(
        &self,
        end_entity: &CertificateDer<'_>,
        pin_unknown: bool,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let presented = Fingerprint::of_der(end_entity.as_ref());
        match self.store.lookup(&self.host_port) {
            Some(known) if known == presented => Ok(ServerCertVerified::assertion()),
            Some(known) => Err(self.reject(UntrustedReason::FingerprintMismatch {
                known,
                presented,
            })),
            None if pin_unknown => {
                self.store
                    .pin(self.host_port.clone(), presented)
                    .map_err(|e| rustls::Error::Other(OtherError(Arc::new(e))))?;
                Ok(ServerCertVerified::assertion())
            }
            None => Err(self.reject(UntrustedReason::UnknownHost)),
        }
    }

    fn check_ca(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match &self.ca_verifier {
            Some(ca) => ca
                .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
                .map_err(|e| self.reject(UntrustedReason::CaValidation(e.to_string()))),
            None => Err(self.reject(UntrustedReason::CaValidation(
                "no CA roots configured".into(),
            ))),
        }
    }
}

impl ServerCertVerifier for PolicyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match self.policy {
            TrustPolicy::Insecure => Ok(ServerCertVerified::assertion()),
            TrustPolicy::Whitelist => self.check_pinned(end_entity, false),
            TrustPolicy::Tofu => self.check_pinned(end_entity, true),
            TrustPolicy::Ca => {
                self.check_ca(end_entity, intermediates, server_name, ocsp_response, now)
            }
            TrustPolicy::CaOrTofu => self
                .check_ca(end_entity, intermediates, server_name, ocsp_response, now)
                .or_else(|_| self.check_pinned(end_entity, true)),
            TrustPolicy::CaOrWhitelist => self
                .check_ca(end_entity, intermediates, server_name, ocsp_response, now)
                .or_else(|_| self.check_pinned(end_entity, false)),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        match self.policy {
            TrustPolicy::Insecure => Ok(HandshakeSignatureValid::assertion()),
            _ => rustls::crypto::verify_tls12_signature(message, cert, dss, &self.supported),
        }
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        match self.policy {
            TrustPolicy::Insecure => Ok(HandshakeSignatureValid::assertion()),
            _ => rustls::crypto::verify_tls13_signature(message, cert, dss, &self.supported),
        }
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.supported.supported_schemes()
    }
}
