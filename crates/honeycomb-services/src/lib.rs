//! Demonstration services for the Honeycomb platform.
//!
//! Three small sandbox modules (`NOOPService`, `FeedService`,
//! `CacheService`) with their registration manifests, plus the JSON-RPC
//! endpoint that hosts them in a container. These consume the cores; they
//! are deliberately unexciting.

mod cache;
mod feed;
mod noop;
mod rpc_server;

pub use cache::CacheService;
pub use cache::cache_manifest;
pub use feed::FeedService;
pub use feed::feed_manifest;
pub use noop::NoopService;
pub use noop::noop_manifest;
pub use rpc_server::build_rpc_router;
pub use rpc_server::demo_container;
