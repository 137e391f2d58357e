//! Signed envelopes: certificates and registrations.
//!
//! Both the certificate authority and the registration flow use the same
//! envelope shape: a JSON payload plus a base64 signature over the payload's
//! canonical encoding. `serde_json` keeps object keys sorted, so serializing
//! a payload yields a canonical byte string suitable for signing.

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::Snafu;

use crate::manifest::ServiceManifest;

/// Result type for envelope encoding operations.
pub type Result<T, E = EnvelopeError> = std::result::Result<T, E>;

/// Errors produced while encoding or decoding envelopes.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum EnvelopeError {
    /// Payload serialization failed.
    #[snafu(display("payload encoding failed: {}", source))]
    Encode {
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Payload deserialization failed.
    #[snafu(display("payload decoding failed: {}", source))]
    Decode {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// A signed payload: the JSON body plus a base64 signature over its
/// canonical encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope<P> {
    /// The signed body.
    pub payload: P,
    /// Base64-encoded signature over the canonical JSON of `payload`.
    pub signature: String,
}

impl<P: Serialize + DeserializeOwned> SignedEnvelope<P> {
    /// Canonical signing input: the JSON encoding of the payload.
    ///
    /// `serde_json` maps are key-sorted, so two structurally equal payloads
    /// always produce identical bytes.
    pub fn signing_input(&self) -> Result<Vec<u8>> {
        canonical_json(&self.payload)
    }
}

/// Canonical JSON bytes of any serializable value.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| EnvelopeError::Encode { source })
}

/// Request presented to the certificate authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequest {
    /// Application the service belongs to.
    pub app: String,
    /// The service manifest being attested.
    pub service: ServiceManifest,
    /// Base64 SPKI DER public key of the requesting service.
    pub public_key: String,
}

/// Metadata appended by the certificate authority at issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateMetadata {
    /// Fresh UUID identifying this deployment.
    pub deployment_id: String,
    /// Fresh UUID identifying this certificate.
    pub certificate_id: String,
    /// Identity of the issuing instance.
    pub instance_id: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub issued_at: u64,
    /// Expiry time: `issued_at` plus seven days.
    pub expires_at: u64,
}

/// The signed body of a service certificate: the request claims verbatim,
/// plus issuance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePayload {
    /// Application claim, copied from the request.
    pub app: String,
    /// Service manifest claim, copied from the request.
    pub service: ServiceManifest,
    /// Public key claim, copied from the request.
    pub public_key: String,
    /// Issuance metadata.
    pub metadata: CertificateMetadata,
}

/// An instance-signed certificate binding a manifest to an instance identity.
pub type ServiceCertificate = SignedEnvelope<CertificatePayload>;

/// The signed body of a registration request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPayload {
    /// Application the service belongs to.
    pub app: String,
    /// The service manifest, field-for-field equal to the certified claims.
    pub service: ServiceManifest,
    /// Base64 of the JSON-encoded certificate envelope.
    #[serde(rename = "HC2ServiceCertificate")]
    pub certificate: String,
}

/// A registration submitted by a service at startup.
pub type SignedRegistration = SignedEnvelope<RegistrationPayload>;
