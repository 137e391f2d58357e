//! Durable document store interface for the Honeycomb control plane.
//!
//! The registry persists registration receipts as JSON documents; the change
//! propagator consumes the store's change stream to materialize routing
//! profiles. Both sides program against the [`DocumentStore`] trait so the
//! backing store can be swapped:
//!
//! - [`MemoryDocumentStore`]: deterministic in-memory store for unit tests
//!   and single-process deployments. No network or disk I/O.
//! - [`HttpDocumentStore`]: client for a CouchDB-style HTTP document store
//!   with a long-poll `_changes` feed.

mod http;
mod memory;
mod traits;
mod types;

pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;
pub use traits::DocumentStore;
pub use types::ChangeEvent;
pub use types::Document;
pub use types::Result;
pub use types::StoreError;
