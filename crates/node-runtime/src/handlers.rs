//! HTTP handlers for the node-to-node surface.

use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error, warn};
use velum_directory::ConcurrentNetworkNodes;
use velum_wire::{ContentType, ErrorBody};

/// `POST /partyinfo` - the single directory-exchange endpoint.
///
/// Per request: gate the declared content type, decode the caller's
/// directory snapshot, merge it (remote-wins), and answer with the merged
/// local directory in the same format. An undeclared or unsupported
/// content type is answered 404, the same as an unrecognized route - a
/// deliberate contract of this protocol, kept as-is. A snapshot that fails
/// to decode leaves the local directory untouched and is answered 500 with
/// a stable error code.
pub async fn party_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let declared = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let Some(format) = declared.and_then(ContentType::from_header) else {
        debug!(declared = declared.unwrap_or("<none>"), "party info with unrecognized content type");
        return StatusCode::NOT_FOUND.into_response();
    };

    let remote: ConcurrentNetworkNodes = match velum_wire::deserialize(format, &body) {
        Ok(remote) => remote,
        Err(err) => {
            warn!(%format, error = %err, "party info body failed to decode");
            // `deserialize` failures always carry a code for this format.
            let body = ErrorBody::from_wire_error(&err).unwrap_or(ErrorBody {
                error: velum_wire::ErrorCode::deserialization(format),
                message: err.to_string(),
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    state.nodes.merge(&remote);
    debug!(peer = %remote.url(), entries = remote.len(), "merged party info");

    match velum_wire::serialize(format, &*state.nodes) {
        Ok(bytes) => ([(CONTENT_TYPE, format.header_value())], bytes).into_response(),
        Err(err) => {
            error!(%format, error = %err, "failed to encode party info response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /upcheck` - liveness probe.
pub async fn upcheck() -> &'static str {
    "I'm up!"
}
