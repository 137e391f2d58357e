//! Certificate issuance and verification.

use honeycomb_core::CertificateMetadata;
use honeycomb_core::CertificatePayload;
use honeycomb_core::CertificateRequest;
use honeycomb_core::ServiceCertificate;
use honeycomb_core::SignedEnvelope;
use honeycomb_core::VALIDITY_WINDOW_MS;
use honeycomb_core::now_unix_ms;
use honeycomb_core::signed::canonical_json;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::CaError;
use crate::error::Result;
use crate::keys::InstanceKeyPair;

/// Outcome of certificate verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the signature verifies under the instance public key.
    pub verified: bool,
}

/// Key-pair owner for one instance.
///
/// Signs deployment-scoped certificates and verifies presented ones. All
/// signing operations funnel through this struct; the private key is not
/// reachable from outside.
pub struct CertificateAuthority {
    keys: InstanceKeyPair,
    instance_id: String,
}

impl CertificateAuthority {
    /// Create an authority from a generated key pair.
    pub fn new(keys: InstanceKeyPair, instance_id: impl Into<String>) -> Self {
        Self {
            keys,
            instance_id: instance_id.into(),
        }
    }

    /// Generate an authority with a fresh key pair.
    pub fn generate(instance_id: impl Into<String>) -> Result<Self> {
        Ok(Self::new(InstanceKeyPair::generate()?, instance_id))
    }

    /// The issuing instance's id.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Base64 SPKI DER of the instance public key.
    pub fn public_key_b64(&self) -> Result<String> {
        self.keys.public_key_b64()
    }

    /// Issue a certificate for the given request.
    ///
    /// The request claims are copied verbatim into the payload; metadata
    /// (fresh deployment and certificate ids, issuing instance, issuance and
    /// expiry times) is appended, and the canonical JSON of the payload is
    /// signed under the instance private key.
    pub fn generate_certificate(&self, request: CertificateRequest) -> Result<ServiceCertificate> {
        let issued_at = now_unix_ms();
        let payload = CertificatePayload {
            app: request.app,
            service: request.service,
            public_key: request.public_key,
            metadata: CertificateMetadata {
                deployment_id: Uuid::new_v4().to_string(),
                certificate_id: Uuid::new_v4().to_string(),
                instance_id: self.instance_id.clone(),
                issued_at,
                expires_at: issued_at + VALIDITY_WINDOW_MS,
            },
        };

        let message = canonical_json(&payload).map_err(|source| CaError::PayloadEncoding { source })?;
        let signature = self.keys.sign(&message)?;
        debug!(
            certificate_id = %payload.metadata.certificate_id,
            service = %payload.service.name,
            "issued service certificate"
        );
        Ok(SignedEnvelope { payload, signature })
    }

    /// Verify a presented certificate under the instance public key.
    ///
    /// Signature decode failures and mismatches both yield
    /// `verified = false`; this never errors. Expiry is not checked here.
    pub fn verify_certificate(&self, certificate: &ServiceCertificate) -> Verification {
        let Ok(message) = canonical_json(&certificate.payload) else {
            return Verification { verified: false };
        };
        Verification {
            verified: self.keys.verify(&message, &certificate.signature),
        }
    }
}

#[cfg(test)]
mod tests {
    use honeycomb_core::ServiceManifest;
    use serde_json::json;

    use super::*;

    fn request() -> CertificateRequest {
        let service: ServiceManifest = serde_json::from_value(json!({
            "name": "NOOPService",
            "version": "0.0.1",
            "dependsOn": ["CacheService"],
            "ports": [3001],
            "api": {"description": "noop", "methods": [{"name": "hello", "params": {"type": "object"}}]},
            "network": {
                "internalOnly": false,
                "publicHostName": "noop",
                "rpcEndpoint": "http://noop_service:3001/rpc"
            }
        }))
        .unwrap();
        CertificateRequest {
            app: "current.ly".into(),
            service,
            public_key: "c2VydmljZS1rZXk=".into(),
        }
    }

    #[test]
    fn issued_certificate_verifies() {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let certificate = ca.generate_certificate(request()).unwrap();
        assert!(ca.verify_certificate(&certificate).verified);
    }

    #[test]
    fn claims_are_copied_verbatim_and_metadata_appended() {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let certificate = ca.generate_certificate(request()).unwrap();

        assert_eq!(certificate.payload.app, "current.ly");
        assert_eq!(certificate.payload.service.name, "NOOPService");
        assert_eq!(certificate.payload.public_key, "c2VydmljZS1rZXk=");

        let meta = &certificate.payload.metadata;
        assert_eq!(meta.instance_id, "instance-1");
        assert_eq!(meta.expires_at - meta.issued_at, VALIDITY_WINDOW_MS);
        assert_ne!(meta.deployment_id, meta.certificate_id);
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let mut certificate = ca.generate_certificate(request()).unwrap();

        // Flip one character of the base64 signature.
        let mut chars: Vec<char> = certificate.signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        certificate.signature = chars.into_iter().collect();

        assert!(!ca.verify_certificate(&certificate).verified);
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let mut certificate = ca.generate_certificate(request()).unwrap();
        certificate.payload.service.version = "0.0.2".into();
        assert!(!ca.verify_certificate(&certificate).verified);
    }

    #[test]
    fn garbage_signature_reports_unverified_without_error() {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let mut certificate = ca.generate_certificate(request()).unwrap();
        certificate.signature = "%%% not base64 %%%".into();
        assert!(!ca.verify_certificate(&certificate).verified);
    }
}
