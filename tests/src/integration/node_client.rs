//! Trust policies exercised against live TLS servers.
//!
//! Each fixture server is a real TLS listener with a fresh self-signed
//! certificate, answering any request with a canned party-info response.
//! The client under test must complete or abort the handshake purely on
//! the strength of its trust policy.

#[cfg(test)]
mod tests {
    use node_runtime::{ClientError, NodeHttpClient};
    use rustls::pki_types::PrivateKeyDer;
    use rustls::{ServerConnection, StreamOwned};
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::path::PathBuf;
    use std::sync::Arc;
    use url::Url;
    use velum_directory::ConcurrentNetworkNodes;
    use velum_trust::{
        Fingerprint, HostPort, KnownHostsStore, TrustConfig, TrustManager, TrustPolicy,
    };
    use velum_wire::ContentType;

    // =========================================================================
    // TLS FIXTURE SERVER
    // =========================================================================

    /// The directory every fixture server answers with.
    fn canned_directory() -> ConcurrentNetworkNodes {
        ConcurrentNetworkNodes::new(Url::parse("http://www.example.com/").unwrap())
    }

    /// Read one HTTP request off the stream (headers plus declared body).
    fn read_http_request(stream: &mut impl Read) -> std::io::Result<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk)?;
            if n == 0 {
                return Err(std::io::ErrorKind::UnexpectedEof.into());
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                while buf.len() - (header_end + 4) < content_length {
                    let n = stream.read(&mut chunk)?;
                    if n == 0 {
                        return Err(std::io::ErrorKind::UnexpectedEof.into());
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                return Ok(());
            }
        }
    }

    /// Spawn a TLS server with a fresh self-signed certificate for
    /// `localhost`, returning its address and certificate fingerprint.
    fn spawn_tls_server() -> (SocketAddr, Fingerprint) {
        let rcgen::CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let cert_der = cert.der().clone();
        let fingerprint = Fingerprint::of_der(cert_der.as_ref());
        let key = PrivateKeyDer::try_from(key_pair.serialize_der()).unwrap();

        let config = Arc::new(
            rustls::ServerConfig::builder()
                .with_no_client_auth()
                .with_single_cert(vec![cert_der], key)
                .unwrap(),
        );
        let body = velum_wire::serialize(ContentType::Binary, &canned_directory()).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let config = Arc::clone(&config);
                let body = body.clone();
                std::thread::spawn(move || {
                    let Ok(conn) = ServerConnection::new(config) else {
                        return;
                    };
                    let mut tls = StreamOwned::new(conn, stream);
                    // A client that distrusts us aborts mid-handshake and
                    // this read fails; that is the expected path for the
                    // negative tests.
                    if read_http_request(&mut tls).is_err() {
                        return;
                    }
                    let header = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = tls.write_all(header.as_bytes());
                    let _ = tls.write_all(&body);
                    let _ = tls.flush();
                });
            }
        });
        (addr, fingerprint)
    }

    fn known_hosts_path() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known-hosts");
        (dir, path)
    }

    fn client_with(policy: TrustPolicy, known_hosts: &PathBuf) -> NodeHttpClient {
        let manager =
            Arc::new(TrustManager::new(&TrustConfig::new(policy, known_hosts)).unwrap());
        NodeHttpClient::build(manager, 10)
    }

    fn server_url(addr: SocketAddr) -> Url {
        Url::parse(&format!("https://localhost:{}/", addr.port())).unwrap()
    }

    fn payload() -> Vec<u8> {
        let nodes = ConcurrentNetworkNodes::new(Url::parse("http://localhost:1234/").unwrap());
        velum_wire::serialize(ContentType::Binary, &nodes).unwrap()
    }

    // =========================================================================
    // WHITELIST
    // =========================================================================

    #[tokio::test]
    async fn test_whitelisted_server() {
        let (addr, fingerprint) = spawn_tls_server();
        let (_dir, path) = known_hosts_path();
        std::fs::write(
            &path,
            format!("#First line\nlocalhost:{} {}\n", addr.port(), fingerprint),
        )
        .unwrap();

        let client = client_with(TrustPolicy::Whitelist, &path);
        let (status, body) = client
            .post_party_info(&server_url(addr), ContentType::Binary, payload())
            .await
            .unwrap();

        assert_eq!(status, reqwest::StatusCode::OK);
        let answered: ConcurrentNetworkNodes =
            velum_wire::deserialize(ContentType::Binary, &body).unwrap();
        assert_eq!(answered, canned_directory());
    }

    #[tokio::test]
    async fn test_unknown_server_is_rejected_before_any_response() {
        let (addr, _fingerprint) = spawn_tls_server();
        let (_dir, path) = known_hosts_path();

        let client = client_with(TrustPolicy::Whitelist, &path);
        let err = client
            .post_party_info(&server_url(addr), ContentType::Binary, payload())
            .await
            .unwrap_err();

        // No status, no body: the handshake never completed.
        assert!(
            matches!(err, ClientError::UntrustedPeer { .. }),
            "expected a trust rejection, got: {err}"
        );
    }

    #[tokio::test]
    async fn test_mismatched_fingerprint_is_rejected() {
        let (addr, _fingerprint) = spawn_tls_server();
        let (_dir, path) = known_hosts_path();
        // Pin a fingerprint that belongs to some other certificate.
        std::fs::write(
            &path,
            format!(
                "localhost:{} {}\n",
                addr.port(),
                Fingerprint::of_der(b"some other certificate")
            ),
        )
        .unwrap();

        let client = client_with(TrustPolicy::Whitelist, &path);
        let err = client
            .post_party_info(&server_url(addr), ContentType::Binary, payload())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UntrustedPeer { .. }));
    }

    // =========================================================================
    // TOFU
    // =========================================================================

    #[tokio::test]
    async fn test_tofu_pins_on_first_use() {
        let (addr, fingerprint) = spawn_tls_server();
        let (_dir, path) = known_hosts_path();

        let client = client_with(TrustPolicy::Tofu, &path);
        let (status, _) = client
            .post_party_info(&server_url(addr), ContentType::Binary, payload())
            .await
            .unwrap();
        assert_eq!(status, reqwest::StatusCode::OK);

        // The pin is persisted for future processes.
        let store = KnownHostsStore::load(&path).unwrap();
        assert_eq!(
            store.lookup(&HostPort::new("localhost", addr.port())),
            Some(fingerprint)
        );

        // And the same server keeps being accepted.
        let (status, _) = client
            .post_party_info(&server_url(addr), ContentType::Binary, payload())
            .await
            .unwrap();
        assert_eq!(status, reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tofu_rejects_a_changed_certificate() {
        let (addr, _fingerprint) = spawn_tls_server();
        let (_dir, path) = known_hosts_path();
        // A previous process pinned a different certificate for this
        // authority.
        std::fs::write(
            &path,
            format!(
                "localhost:{} {}\n",
                addr.port(),
                Fingerprint::of_der(b"previously pinned certificate")
            ),
        )
        .unwrap();

        let client = client_with(TrustPolicy::Tofu, &path);
        let err = client
            .post_party_info(&server_url(addr), ContentType::Binary, payload())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UntrustedPeer { .. }));
    }

    // =========================================================================
    // INSECURE
    // =========================================================================

    #[tokio::test]
    async fn test_insecure_accepts_any_server() {
        let (addr, _fingerprint) = spawn_tls_server();
        let (_dir, path) = known_hosts_path();

        let client = client_with(TrustPolicy::Insecure, &path);
        let (status, _) = client
            .post_party_info(&server_url(addr), ContentType::Binary, payload())
            .await
            .unwrap();
        assert_eq!(status, reqwest::StatusCode::OK);
    }
}
