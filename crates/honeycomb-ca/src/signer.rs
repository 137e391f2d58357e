//! Registration signing for service processes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use honeycomb_core::RegistrationPayload;
use honeycomb_core::ServiceCertificate;
use honeycomb_core::ServiceManifest;
use honeycomb_core::SignedEnvelope;
use honeycomb_core::SignedRegistration;
use honeycomb_core::signed::canonical_json;

use crate::error::CaError;
use crate::error::Result;
use crate::keys::InstanceKeyPair;
use crate::keys::verify_with_b64_key;

/// A service-side key pair used to sign registration requests.
///
/// Services hold their own key pair, embed its public half in certificate
/// requests, and sign their registration envelope with the private half.
/// The registry verifies that outer signature under the public key carried
/// inside the certificate.
pub struct ServiceSigner {
    keys: InstanceKeyPair,
}

impl ServiceSigner {
    /// Generate a fresh service key pair.
    pub fn generate() -> Result<Self> {
        Ok(Self {
            keys: InstanceKeyPair::generate()?,
        })
    }

    /// Base64 SPKI DER of the service public key, for certificate requests.
    pub fn public_key_b64(&self) -> Result<String> {
        self.keys.public_key_b64()
    }

    /// Build and sign a registration envelope embedding the certificate.
    pub fn sign_registration(
        &self,
        app: impl Into<String>,
        service: ServiceManifest,
        certificate: &ServiceCertificate,
    ) -> Result<SignedRegistration> {
        let certificate_json = canonical_json(certificate).map_err(|source| CaError::PayloadEncoding { source })?;
        let payload = RegistrationPayload {
            app: app.into(),
            service,
            certificate: BASE64.encode(certificate_json),
        };
        let message = canonical_json(&payload).map_err(|source| CaError::PayloadEncoding { source })?;
        let signature = self.keys.sign(&message)?;
        Ok(SignedEnvelope { payload, signature })
    }
}

/// Verify a registration's outer signature under a base64 public key
/// (normally the one embedded in its certificate).
pub fn verify_registration_signature(registration: &SignedRegistration, public_key_b64: &str) -> bool {
    let Ok(message) = canonical_json(&registration.payload) else {
        return false;
    };
    verify_with_b64_key(public_key_b64, &message, &registration.signature)
}

#[cfg(test)]
mod tests {
    use honeycomb_core::CertificateRequest;
    use serde_json::json;

    use super::*;
    use crate::authority::CertificateAuthority;

    fn manifest() -> ServiceManifest {
        serde_json::from_value(json!({
            "name": "NOOPService",
            "version": "0.0.1",
            "api": {},
            "network": {"publicHostName": "noop", "rpcEndpoint": "http://noop:3001/rpc"}
        }))
        .unwrap()
    }

    #[test]
    fn registration_signature_verifies_under_certified_key() {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let signer = ServiceSigner::generate().unwrap();

        let certificate = ca
            .generate_certificate(CertificateRequest {
                app: "current.ly".into(),
                service: manifest(),
                public_key: signer.public_key_b64().unwrap(),
            })
            .unwrap();

        let registration = signer.sign_registration("current.ly", manifest(), &certificate).unwrap();
        assert!(verify_registration_signature(
            &registration,
            &certificate.payload.public_key
        ));
    }

    #[test]
    fn registration_signed_by_other_key_fails() {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let signer = ServiceSigner::generate().unwrap();
        let impostor = ServiceSigner::generate().unwrap();

        let certificate = ca
            .generate_certificate(CertificateRequest {
                app: "current.ly".into(),
                service: manifest(),
                public_key: signer.public_key_b64().unwrap(),
            })
            .unwrap();

        let registration = impostor.sign_registration("current.ly", manifest(), &certificate).unwrap();
        assert!(!verify_registration_signature(
            &registration,
            &certificate.payload.public_key
        ));
    }

    #[test]
    fn embedded_certificate_round_trips_from_base64() {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let signer = ServiceSigner::generate().unwrap();

        let certificate = ca
            .generate_certificate(CertificateRequest {
                app: "current.ly".into(),
                service: manifest(),
                public_key: signer.public_key_b64().unwrap(),
            })
            .unwrap();

        let registration = signer.sign_registration("current.ly", manifest(), &certificate).unwrap();
        let decoded = BASE64.decode(&registration.payload.certificate).unwrap();
        let embedded: ServiceCertificate = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(embedded, certificate);
        assert!(ca.verify_certificate(&embedded).verified);
    }
}
