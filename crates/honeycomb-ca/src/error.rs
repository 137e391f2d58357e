//! Error types for certificate operations.

use snafu::Snafu;

/// Result type for CA operations.
pub type Result<T, E = CaError> = std::result::Result<T, E>;

/// Errors produced while generating keys or issuing certificates.
///
/// Verification failures are not errors: [`super::CertificateAuthority::verify`]
/// reports them as `verified = false`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CaError {
    /// Key pair generation failed.
    #[snafu(display("key generation failed: {}", source))]
    KeyGeneration {
        /// Underlying RSA error.
        source: rsa::Error,
    },

    /// A public key could not be encoded or decoded.
    #[snafu(display("public key codec failure: {}", reason))]
    PublicKeyCodec {
        /// What went wrong with the key material.
        reason: String,
    },

    /// The payload could not be serialized for signing.
    #[snafu(display("payload encoding failed: {}", source))]
    PayloadEncoding {
        /// Underlying envelope error.
        source: honeycomb_core::signed::EnvelopeError,
    },

    /// Producing a signature failed.
    #[snafu(display("signing failed: {}", reason))]
    Signing {
        /// Underlying signature failure.
        reason: String,
    },
}
