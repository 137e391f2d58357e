//! Registry HTTP handlers.

mod certs;
mod health;
mod services;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
pub use certs::issue_certificate;
pub use certs::verify_certificate;
use honeycomb_core::ProblemDetail;
pub use health::health;
pub use services::list_services;
pub use services::register_service;

/// Render a problem-detail document with its status.
pub(crate) fn problem_response(status: StatusCode, problem: ProblemDetail) -> Response {
    let body = serde_json::to_vec(&problem).unwrap_or_default();
    Response::builder()
        .status(status)
        .header("content-type", "application/problem+json")
        .body(Body::from(body))
        .unwrap_or_else(|_| status.into_response())
}
