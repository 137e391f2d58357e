//! Certificate issuance and verification handlers.

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use honeycomb_core::CERT_URN_PREFIX;
use honeycomb_core::CertificateRequest;
use honeycomb_core::HEADER_RESOURCE;
use honeycomb_core::ProblemDetail;
use honeycomb_core::ServiceCertificate;
use tracing::warn;

use crate::handlers::problem_response;
use crate::state::AppState;

/// `POST /api/v1/certs` - issue a certificate for the request claims.
pub async fn issue_certificate(State(state): State<AppState>, Json(request): Json<CertificateRequest>) -> Response {
    match state.ca.generate_certificate(request) {
        Ok(certificate) => {
            let urn = format!("{}:{}", CERT_URN_PREFIX, certificate.payload.metadata.certificate_id);
            (StatusCode::CREATED, [(HEADER_RESOURCE, urn)], Json(certificate)).into_response()
        }
        Err(error) => {
            warn!(error = %error, "certificate issuance failed");
            problem_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ProblemDetail::internal(error.to_string(), "/api/v1/certs"),
            )
        }
    }
}

/// `POST /api/v1/certs/{id}/verify` - verify a presented certificate.
///
/// `204` when the envelope verifies under the instance key and names the
/// addressed certificate; `403` with a `cert-invalid` problem otherwise.
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
    Json(certificate): Json<ServiceCertificate>,
) -> Response {
    let instance = format!("/api/v1/certs/{}/verify", certificate_id);

    if certificate.payload.metadata.certificate_id != certificate_id {
        return problem_response(
            StatusCode::FORBIDDEN,
            ProblemDetail::cert_invalid("envelope does not name the addressed certificate", instance),
        );
    }

    if state.ca.verify_certificate(&certificate).verified {
        StatusCode::NO_CONTENT.into_response()
    } else {
        problem_response(
            StatusCode::FORBIDDEN,
            ProblemDetail::cert_invalid("signature does not verify under this instance", instance),
        )
    }
}
