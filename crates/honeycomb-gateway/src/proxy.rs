//! Reverse proxy to the instance registry.

use axum::body::Body;
use axum::body::to_bytes;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use honeycomb_core::ProblemDetail;
use tracing::debug;
use tracing::warn;

use crate::router::GatewayState;

/// Maximum request body the proxy will buffer (1 MB).
const MAX_PROXY_BODY: usize = 1024 * 1024;

/// Response headers forwarded back to the caller.
const FORWARDED_HEADERS: &[&str] = &["content-type", "x-count", "x-hc2-resource"];

/// Forward a request under `/api/` to the instance registry.
///
/// Anything outside `/api/` is not routable through the gateway.
pub(crate) async fn forward(State(state): State<GatewayState>, request: Request) -> Response {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if !path_and_query.starts_with("/api/") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let method = request.method().clone();
    let content_type = request
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = match to_bytes(request.into_body(), MAX_PROXY_BODY).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(error = %error, "failed to buffer proxied request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let url = format!("{}{}", state.upstream, path_and_query);
    debug!(%method, %url, "proxying to registry");

    let upstream_method = match reqwest::Method::from_bytes(method.as_str().as_bytes()) {
        Ok(m) => m,
        Err(_) => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };

    let mut upstream_request = state.http.request(upstream_method, &url).body(body.to_vec());
    if let Some(ct) = content_type {
        upstream_request = upstream_request.header("content-type", ct);
    }

    let upstream_response = match upstream_request.send().await {
        Ok(response) => response,
        Err(error) => {
            warn!(error = %error, %url, "registry upstream unreachable");
            let problem = ProblemDetail::upstream_unavailable(error.to_string(), path_and_query);
            let body = serde_json::to_vec(&problem).unwrap_or_default();
            return Response::builder()
                .status(StatusCode::BAD_GATEWAY)
                .header("content-type", "application/problem+json")
                .body(Body::from(body))
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response());
        }
    };

    let status = StatusCode::from_u16(upstream_response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);
    for name in FORWARDED_HEADERS {
        if let Some(value) = upstream_response.headers().get(*name).and_then(|v| v.to_str().ok()) {
            builder = builder.header(*name, value);
        }
    }

    let bytes = upstream_response.bytes().await.unwrap_or_default();
    builder.body(Body::from(bytes)).unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
}
