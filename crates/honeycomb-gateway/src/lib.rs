//! Gateway: the one authoritative ingress for an instance.
//!
//! ## Router structure
//!
//! ```text
//! /
//! ├── /api/v1/profiles   - read-only materialized profile list
//! ├── /health            - liveness
//! └── /api/*             - reverse-proxied to the instance registry
//! ```
//!
//! No service is reachable except through this door, and routing decisions
//! are based only on registered state.

mod proxy;
mod router;

pub use router::GatewayState;
pub use router::build_router;
