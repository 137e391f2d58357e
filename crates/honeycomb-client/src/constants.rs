//! Client protocol constants.

use std::time::Duration;

/// Per-call timeout for JSON-RPC dispatch.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for control-plane HTTP calls (registration, profile sync).
pub const CONTROL_PLANE_TIMEOUT: Duration = Duration::from_secs(15);

/// Ceiling for retry-after hints advised by failing instances.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(5);
