//! Party-info handler behavior through the real router.
//!
//! Mirrors how a peer drives the endpoint: one POST per exchange, the
//! declared content type selecting the codec, the response carrying the
//! merged local directory in the same format.

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{Request, StatusCode};
    use node_runtime::{build_router, AppState};
    use std::sync::Arc;
    use tower::ServiceExt;
    use url::Url;
    use velum_directory::{ConcurrentNetworkNodes, NodeId};
    use velum_wire::{ContentType, ErrorBody, ErrorCode};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    /// A local directory with two peers already known.
    fn local_nodes() -> Arc<ConcurrentNetworkNodes> {
        let nodes = Arc::new(ConcurrentNetworkNodes::new(url("http://127.0.0.1:9000/")));
        nodes.add_node(NodeId::new(*b"pk1"), url("http://127.0.0.1:9001/"));
        nodes.add_node(NodeId::new(*b"pk2"), url("http://127.0.0.1:9002/"));
        nodes
    }

    async fn post_party_info(
        nodes: Arc<ConcurrentNetworkNodes>,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> (StatusCode, Vec<u8>) {
        let router = build_router(AppState { nodes });
        let mut request = Request::post("/partyinfo");
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        let response = router
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, bytes)
    }

    // =========================================================================
    // SUCCESSFUL EXCHANGES
    // =========================================================================

    #[tokio::test]
    async fn test_successful_processing_of_request() {
        let local = local_nodes();
        let remote = ConcurrentNetworkNodes::new(url("http://127.0.0.1:9100/"));
        remote.add_node(NodeId::new(*b"pk3"), url("http://127.0.0.1:9003/"));
        let payload = velum_wire::serialize(ContentType::Binary, &remote).unwrap();

        let (status, body) = post_party_info(
            Arc::clone(&local),
            Some("application/octet-stream"),
            payload,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // The response is the merged local directory in the same format.
        let answered: ConcurrentNetworkNodes =
            velum_wire::deserialize(ContentType::Binary, &body).unwrap();
        assert_eq!(answered, *local);

        // The merge took the union.
        assert_eq!(local.len(), 3);
        assert_eq!(
            local.node_url(&NodeId::new(*b"pk3")),
            Some(url("http://127.0.0.1:9003/"))
        );
    }

    #[tokio::test]
    async fn test_exchange_in_json_format() {
        let local = local_nodes();
        let remote = ConcurrentNetworkNodes::new(url("http://127.0.0.1:9100/"));
        remote.add_node(NodeId::new(*b"pk3"), url("http://127.0.0.1:9003/"));
        let payload = velum_wire::serialize(ContentType::Json, &remote).unwrap();

        let (status, body) =
            post_party_info(Arc::clone(&local), Some("application/json"), payload).await;
        assert_eq!(status, StatusCode::OK);

        let answered: ConcurrentNetworkNodes =
            velum_wire::deserialize(ContentType::Json, &body).unwrap();
        assert_eq!(answered, *local);
        assert_eq!(local.len(), 3);
    }

    #[tokio::test]
    async fn test_merge_prefers_the_incoming_snapshot() {
        let local = local_nodes();
        let remote = ConcurrentNetworkNodes::new(url("http://127.0.0.1:9100/"));
        // Same identity as a known peer, different address.
        remote.add_node(NodeId::new(*b"pk1"), url("http://127.0.0.1:9999/"));
        let payload = velum_wire::serialize(ContentType::Binary, &remote).unwrap();

        let (status, _) = post_party_info(
            Arc::clone(&local),
            Some("application/octet-stream"),
            payload,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            local.node_url(&NodeId::new(*b"pk1")),
            Some(url("http://127.0.0.1:9999/"))
        );
    }

    // =========================================================================
    // CONTENT-TYPE GATE
    // =========================================================================

    #[tokio::test]
    async fn test_party_info_with_invalid_content_type() {
        let local = local_nodes();
        // A perfectly valid payload under a type this node does not speak
        // is treated like an unknown route.
        let payload = velum_wire::serialize(ContentType::Json, &*local).unwrap();

        let (status, _) =
            post_party_info(Arc::clone(&local), Some("application/cbor"), payload).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(local.len(), 2);
    }

    #[tokio::test]
    async fn test_party_info_without_content_type() {
        let local = local_nodes();
        let (status, _) = post_party_info(Arc::clone(&local), None, b"{}".to_vec()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // =========================================================================
    // MALFORMED BODIES
    // =========================================================================

    #[tokio::test]
    async fn test_party_info_with_invalid_body() {
        let local = local_nodes();
        let (status, body) = post_party_info(
            Arc::clone(&local),
            Some("application/octet-stream"),
            b"foo".to_vec(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, ErrorCode::ObjectBinaryDeserialization);

        // A failed decode leaves the directory untouched.
        assert_eq!(local.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_json_body_carries_json_code() {
        let local = local_nodes();
        let (status, body) =
            post_party_info(Arc::clone(&local), Some("application/json"), b"foo".to_vec()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, ErrorCode::ObjectJsonDeserialization);
    }
}
