//! Claim validation against certified payloads.
//!
//! The certificate payload is the source of truth. Validation builds a JSON
//! Schema in which every certified claim becomes a `const` match and checks
//! the registration payload against it, so a tampered registration fails
//! even when its certificate still verifies.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use honeycomb_core::CertificatePayload;
use honeycomb_core::ServiceCertificate;
use honeycomb_core::SignedRegistration;
use jsonschema::JSONSchema;
use serde_json::Value;
use serde_json::json;

use crate::error::RegistryError;
use crate::error::Result;

/// Decode the base64-embedded certificate envelope from a registration.
pub fn decode_embedded_certificate(registration: &SignedRegistration) -> Result<ServiceCertificate> {
    let raw = BASE64.decode(&registration.payload.certificate).map_err(|e| RegistryError::CertificateMalformed {
        reason: format!("base64 decode failed: {}", e),
    })?;
    serde_json::from_slice(&raw).map_err(|e| RegistryError::CertificateMalformed {
        reason: format!("envelope decode failed: {}", e),
    })
}

/// Check that the registration's declared fields equal the certified claims.
///
/// Claims are the request fields the certificate attests: the app name and
/// the full service manifest. Certificate metadata and the embedded
/// certificate itself are excluded from matching.
pub fn validate_claims(registration: &SignedRegistration, certified: &CertificatePayload) -> Result<()> {
    let schema = claim_schema(certified)?;
    let compiled = JSONSchema::compile(&schema).map_err(|e| RegistryError::SchemaCompile {
        reason: e.to_string(),
    })?;

    let instance = serde_json::to_value(&registration.payload).map_err(|e| RegistryError::SchemaCompile {
        reason: e.to_string(),
    })?;

    if let Err(errors) = compiled.validate(&instance) {
        let detail = errors.map(|e| format!("{} at {}", e, e.instance_path)).collect::<Vec<_>>().join("; ");
        return Err(RegistryError::ClaimMismatch { detail });
    }
    Ok(())
}

/// Build the const-match schema for a certified payload.
fn claim_schema(certified: &CertificatePayload) -> Result<Value> {
    let service = serde_json::to_value(&certified.service).map_err(|e| RegistryError::SchemaCompile {
        reason: e.to_string(),
    })?;
    Ok(json!({
        "type": "object",
        "properties": {
            "app": {"const": certified.app},
            "service": {"const": service},
        },
        "required": ["app", "service"],
    }))
}
