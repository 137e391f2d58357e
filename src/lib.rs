//! Honeycomb instance daemon.
//!
//! One instance pairs a certificate authority, a service registry, a durable
//! store, a change propagator, and a gateway. This crate wires the component
//! crates into two HTTP surfaces: the internal registry app (certificates and
//! registrations) and the public gateway front door (profiles, health, and a
//! reverse proxy to the registry).

pub mod banner;
pub mod config;
pub mod handlers;
pub mod server;
pub mod state;
