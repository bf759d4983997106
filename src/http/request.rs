//! Request identification.
//!
//! # Responsibilities
//! - Assign a UUID `x-request-id` to requests that lack one
//! - Echo the id back on the response
//! - Open a tracing span carrying the id for every request
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A caller-supplied id is kept, not replaced

use axum::body::Body;
use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const UNKNOWN_REQUEST_ID: &str = "unknown";

/// Access to the request id header.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(UNKNOWN_REQUEST_ID)
    }
}

/// Layer assigning ids to incoming requests.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer copying the id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Span used by the HTTP trace layer.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request.request_id(),
        method = %request.method(),
        path = %request.uri().path(),
    )
}
