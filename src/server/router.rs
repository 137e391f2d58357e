//! Registry router configuration.
//!
//! ```text
//! /
//! ├── /api/v1/certs              - POST: issue a certificate
//! ├── /api/v1/certs/{id}/verify  - POST: verify a presented certificate
//! ├── /api/v1/services           - POST: register / GET: list receipts
//! └── /health                    - liveness
//! ```
//!
//! This app listens on the internal port; the public gateway fronts it and
//! reverse-proxies `/api/*` here.

use axum::Router;
use axum::routing::get;
use axum::routing::post;

use crate::handlers::health;
use crate::handlers::issue_certificate;
use crate::handlers::list_services;
use crate::handlers::register_service;
use crate::handlers::verify_certificate;
use crate::state::AppState;

/// Build the registry router with all control-plane routes.
pub fn build_registry_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/certs", post(issue_certificate))
        .route("/api/v1/certs/{id}/verify", post(verify_certificate))
        .route("/api/v1/services", post(register_service).get(list_services))
        .route("/health", get(health))
        .with_state(state)
}
