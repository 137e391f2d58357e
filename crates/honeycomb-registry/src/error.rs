//! Error types for registry operations.

use snafu::Snafu;

/// Result type for registry operations.
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

/// Errors produced while validating and persisting registrations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryError {
    /// The embedded certificate could not be decoded.
    #[snafu(display("embedded certificate is malformed: {}", reason))]
    CertificateMalformed {
        /// What failed while decoding.
        reason: String,
    },

    /// A registration field diverges from the certified claims.
    #[snafu(display("registration does not match certified claims: {}", detail))]
    ClaimMismatch {
        /// Which fields diverged.
        detail: String,
    },

    /// The claim schema itself could not be compiled.
    #[snafu(display("claim schema compilation failed: {}", reason))]
    SchemaCompile {
        /// Compiler diagnostics.
        reason: String,
    },

    /// The durable store rejected the receipt write.
    #[snafu(display("receipt persistence failed: {}", source))]
    Persistence {
        /// Underlying store error.
        source: honeycomb_store::StoreError,
    },

    /// A stored document could not be interpreted as a receipt.
    #[snafu(display("stored receipt is malformed: {}", source))]
    ReceiptMalformed {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}
