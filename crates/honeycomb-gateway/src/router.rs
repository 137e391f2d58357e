//! Gateway router wiring.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use honeycomb_propagator::ProfileView;
use serde_json::Value;
use serde_json::json;

use crate::proxy::forward;

/// Shared state for gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Materialized profile view, written by the propagator.
    pub view: ProfileView,
    /// Base URL of the instance registry this gateway fronts.
    pub upstream: String,
    /// HTTP client used by the reverse proxy.
    pub http: reqwest::Client,
}

impl GatewayState {
    /// Create gateway state over a profile view and upstream base URL.
    pub fn new(view: ProfileView, upstream: impl Into<String>) -> Self {
        Self {
            view,
            upstream: upstream.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

/// Build the gateway router.
///
/// Profiles and health are answered locally; every other `/api/*` request is
/// reverse-proxied to the instance registry.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/v1/profiles", get(list_profiles))
        .route("/health", get(health))
        .fallback(forward)
        .with_state(state)
}

/// `GET /api/v1/profiles` - the flattened profile list.
async fn list_profiles(State(state): State<GatewayState>) -> Json<Value> {
    let profiles = state.view.snapshot().await;
    Json(serde_json::to_value(profiles).unwrap_or_else(|_| json!([])))
}

/// `GET /health` - liveness.
async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
