//! Error types for control-plane client operations.
//!
//! These cover registration and sync plumbing. Dispatch does not use them:
//! its outcomes are always [`crate::Envelope`]s.

use snafu::Snafu;

/// Result type for client control-plane operations.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Errors produced while talking to the instance's HTTP surface.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClientError {
    /// The control plane could not be reached.
    #[snafu(display("control plane unreachable: {}", reason))]
    Unreachable {
        /// Transport failure description.
        reason: String,
    },

    /// The control plane rejected the request.
    #[snafu(display("{} returned {}: {}", operation, status, detail))]
    Rejected {
        /// Which operation was rejected.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Problem detail or body excerpt.
        detail: String,
    },

    /// A response body could not be decoded.
    #[snafu(display("malformed response for {}: {}", operation, reason))]
    MalformedResponse {
        /// Which operation produced the body.
        operation: String,
        /// Decode failure description.
        reason: String,
    },

    /// The registration envelope could not be prepared.
    #[snafu(display("registration encoding failed: {}", reason))]
    Encoding {
        /// Encode failure description.
        reason: String,
    },
}
