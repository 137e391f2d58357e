//! Core types and wire formats for the Honeycomb service platform.
//!
//! Everything that crosses a process boundary lives here: service manifests,
//! signed envelopes, certificates, registration receipts, service profiles,
//! and problem-detail documents. Component crates (`honeycomb-ca`,
//! `honeycomb-registry`, `honeycomb-propagator`, ...) depend on this crate
//! and never on each other's internals.

pub mod constants;
pub mod manifest;
pub mod problem;
pub mod profile;
pub mod receipt;
pub mod signed;
pub mod time;

pub use constants::CERT_URN_PREFIX;
pub use constants::HEADER_COUNT;
pub use constants::HEADER_RESOURCE;
pub use constants::RECEIPT_URN_PREFIX;
pub use constants::VALIDITY_WINDOW_MS;
pub use manifest::ApiSpec;
pub use manifest::MethodSpec;
pub use manifest::NetworkSpec;
pub use manifest::ServiceManifest;
pub use problem::ProblemDetail;
pub use profile::ProfileInstance;
pub use profile::ServiceProfile;
pub use receipt::RegistrationReceipt;
pub use signed::CertificateMetadata;
pub use signed::CertificatePayload;
pub use signed::CertificateRequest;
pub use signed::RegistrationPayload;
pub use signed::ServiceCertificate;
pub use signed::SignedEnvelope;
pub use signed::SignedRegistration;
pub use time::now_unix_ms;
