//! Service registration handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use honeycomb_ca::verify_registration_signature;
use honeycomb_core::HEADER_COUNT;
use honeycomb_core::HEADER_RESOURCE;
use honeycomb_core::ProblemDetail;
use honeycomb_core::SignedRegistration;
use honeycomb_registry::RegistryError;
use honeycomb_registry::decode_embedded_certificate;
use honeycomb_registry::validate_claims;
use tracing::info;
use tracing::warn;

use crate::handlers::problem_response;
use crate::state::AppState;

const SERVICES_PATH: &str = "/api/v1/services";

/// `POST /api/v1/services` - accept a signed registration.
///
/// Order of checks: the embedded certificate must verify under this
/// instance, every declared field must equal its certified claim, and the
/// outer envelope must verify under the certified public key. Claims are
/// checked before the outer signature so a tampered body is reported as a
/// claim mismatch, not a signature failure. Only then is a receipt minted
/// and persisted.
pub async fn register_service(State(state): State<AppState>, Json(registration): Json<SignedRegistration>) -> Response {
    let certificate = match decode_embedded_certificate(&registration) {
        Ok(certificate) => certificate,
        Err(error) => {
            return problem_response(
                StatusCode::UNAUTHORIZED,
                ProblemDetail::cert_invalid(error.to_string(), SERVICES_PATH),
            );
        }
    };

    if !state.ca.verify_certificate(&certificate).verified {
        return problem_response(
            StatusCode::UNAUTHORIZED,
            ProblemDetail::cert_invalid("embedded certificate does not verify under this instance", SERVICES_PATH),
        );
    }

    if let Err(error) = validate_claims(&registration, &certificate.payload) {
        warn!(error = %error, service = %registration.payload.service.name, "claim validation failed");
        return problem_response(
            StatusCode::UNAUTHORIZED,
            ProblemDetail::cert_claims_invalid(error.to_string(), SERVICES_PATH),
        );
    }

    if !verify_registration_signature(&registration, &certificate.payload.public_key) {
        return problem_response(
            StatusCode::UNAUTHORIZED,
            ProblemDetail::cert_invalid("registration signature does not verify under the certified key", SERVICES_PATH),
        );
    }

    match state.registry.register(&registration).await {
        Ok(receipt) => {
            info!(receipt_id = %receipt.receipt_id, service = %receipt.service_name, "registration accepted");
            let headers = [(HEADER_COUNT, "1".to_string()), (HEADER_RESOURCE, receipt.urn.clone())];
            (StatusCode::CREATED, headers, Json(receipt)).into_response()
        }
        Err(error @ RegistryError::Persistence { .. }) => {
            warn!(error = %error, "receipt persistence failed, registration aborted");
            problem_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ProblemDetail::internal(error.to_string(), SERVICES_PATH),
            )
        }
        Err(error) => problem_response(
            StatusCode::UNAUTHORIZED,
            ProblemDetail::cert_claims_invalid(error.to_string(), SERVICES_PATH),
        ),
    }
}

/// `GET /api/v1/services` - list persisted receipts.
pub async fn list_services(State(state): State<AppState>) -> Response {
    match state.registry.list_services().await {
        Ok(receipts) => {
            let headers = [(HEADER_COUNT, receipts.len().to_string())];
            (StatusCode::OK, headers, Json(receipts)).into_response()
        }
        Err(error) => {
            warn!(error = %error, "receipt listing failed");
            problem_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ProblemDetail::internal(error.to_string(), SERVICES_PATH),
            )
        }
    }
}
