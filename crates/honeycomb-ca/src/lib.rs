//! Certificate authority for Honeycomb instances.
//!
//! Every instance owns one RSA key pair. The CA signs deployment-scoped
//! certificates attesting service identity claims and verifies signatures on
//! presented certificates. The private key never leaves this crate.
//!
//! Signature scheme: RSA-PSS over SHA-256 with a 32-byte salt, 2048-bit
//! modulus. The signing input is always the canonical JSON encoding of the
//! payload (`serde_json` with its key-sorted maps).

mod authority;
mod error;
mod keys;
mod signer;

pub use authority::CertificateAuthority;
pub use authority::Verification;
pub use error::CaError;
pub use error::Result;
pub use keys::InstanceKeyPair;
pub use signer::ServiceSigner;
pub use signer::verify_registration_signature;
