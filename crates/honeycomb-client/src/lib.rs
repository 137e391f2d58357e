//! Client SDK for the Honeycomb control plane.
//!
//! The SDK registers services against an instance, lazily syncs the
//! gateway's profile view into a local route table, and dispatches JSON-RPC
//! calls to live service instances with multi-instance failover.
//!
//! Dispatch never fails with an `Err`: every outcome, success or not, is a
//! canonical [`Envelope`] whose `data` member is `null` exactly when
//! `has_error` is set. Registration and low-level helpers use ordinary
//! `Result`s; no public path panics.

mod client;
mod constants;
mod dispatch;
mod envelope;
mod error;
mod route_table;
mod rpc;

pub use client::HoneycombClient;
pub use constants::DEFAULT_RPC_TIMEOUT;
pub use dispatch::ServiceHandle;
pub use envelope::Envelope;
pub use envelope::EnvelopeMetadata;
pub use envelope::ErrorCode;
pub use envelope::ErrorDetail;
pub use envelope::ErrorSource;
pub use error::ClientError;
pub use error::Result;
pub use route_table::RouteStatus;
pub use route_table::SyncInfo;
