//! Service registry for the Honeycomb control plane.
//!
//! The registry sits behind the instance's HTTP surface. For each signed
//! registration it checks that the declared fields match the certified
//! claims, mints a registration receipt, and persists one document (claims
//! plus receipt) in the durable store. The change feed takes it from there.
//!
//! Certificate signature verification belongs to `honeycomb-ca`; callers are
//! expected to verify before registering.

mod alias;
mod claims;
mod error;
mod registry;

pub use alias::two_word_alias;
pub use claims::decode_embedded_certificate;
pub use claims::validate_claims;
pub use error::RegistryError;
pub use error::Result;
pub use registry::ServiceRegistry;
