//! Instance key pairs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::pss::BlindedSigningKey;
use rsa::pss::Signature;
use rsa::pss::VerifyingKey;
use rsa::signature::RandomizedSigner;
use rsa::signature::SignatureEncoding;
use rsa::signature::Verifier;
use sha2::Sha256;

use crate::error::CaError;
use crate::error::Result;

/// RSA modulus size for instance keys.
const MODULUS_BITS: usize = 2048;

/// PSS salt length in bytes.
const SALT_LEN: usize = 32;

/// An RSA key pair owned by one process.
///
/// The private half never leaves the struct; callers get signing and
/// verification operations plus the base64 SPKI DER export of the public
/// half for embedding in certificates and receipts.
pub struct InstanceKeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl InstanceKeyPair {
    /// Generate a fresh 2048-bit key pair.
    pub fn generate() -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, MODULUS_BITS).map_err(|source| CaError::KeyGeneration { source })?;
        let public_key = RsaPublicKey::from(&private_key);
        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Base64 of the SPKI DER encoding of the public key.
    pub fn public_key_b64(&self) -> Result<String> {
        let der = self.public_key.to_public_key_der().map_err(|e| CaError::PublicKeyCodec {
            reason: e.to_string(),
        })?;
        Ok(BASE64.encode(der.as_bytes()))
    }

    /// Sign a message with RSA-PSS/SHA-256, returning the base64 signature.
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let mut rng = rand::thread_rng();
        let signing_key = BlindedSigningKey::<Sha256>::new_with_salt_len(self.private_key.clone(), SALT_LEN);
        let signature = signing_key.try_sign_with_rng(&mut rng, message).map_err(|e| CaError::Signing {
            reason: e.to_string(),
        })?;
        Ok(BASE64.encode(signature.to_vec()))
    }

    /// Verify a base64 signature over a message under this key pair's
    /// public half. Decode failures and mismatches both report `false`.
    pub fn verify(&self, message: &[u8], signature_b64: &str) -> bool {
        verify_with_key(&self.public_key, message, signature_b64)
    }
}

/// Verify a base64 signature under a base64 SPKI DER public key.
///
/// Any malformed input (bad base64, bad DER, bad signature bytes) reports
/// `false` rather than erroring.
pub(crate) fn verify_with_b64_key(public_key_b64: &str, message: &[u8], signature_b64: &str) -> bool {
    let Ok(der) = BASE64.decode(public_key_b64) else {
        return false;
    };
    let Ok(public_key) = RsaPublicKey::from_public_key_der(&der) else {
        return false;
    };
    verify_with_key(&public_key, message, signature_b64)
}

fn verify_with_key(public_key: &RsaPublicKey, message: &[u8], signature_b64: &str) -> bool {
    let Ok(raw) = BASE64.decode(signature_b64) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(raw.as_slice()) else {
        return false;
    };
    let verifying_key = VerifyingKey::<Sha256>::new_with_salt_len(public_key.clone(), SALT_LEN);
    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let keys = InstanceKeyPair::generate().unwrap();
        let signature = keys.sign(b"hello").unwrap();
        assert!(keys.verify(b"hello", &signature));
        assert!(!keys.verify(b"other message", &signature));
    }

    #[test]
    fn verify_under_exported_public_key() {
        let keys = InstanceKeyPair::generate().unwrap();
        let public_b64 = keys.public_key_b64().unwrap();
        let signature = keys.sign(b"payload").unwrap();
        assert!(verify_with_b64_key(&public_b64, b"payload", &signature));
    }

    #[test]
    fn malformed_inputs_report_false() {
        let keys = InstanceKeyPair::generate().unwrap();
        assert!(!keys.verify(b"msg", "not!base64!"));
        assert!(!verify_with_b64_key("also not base64", b"msg", "AAAA"));
    }
}
