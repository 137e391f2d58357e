//! Store document and change-event types.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use snafu::Snafu;

/// Result type for store operations.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors produced by document store backends.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[snafu(display("store operation failed: {}", reason))]
    Failed {
        /// Backend-specific failure description.
        reason: String,
    },

    /// The backend could not be reached.
    #[snafu(display("store unreachable: {}", reason))]
    Unreachable {
        /// Transport-level failure description.
        reason: String,
    },

    /// A document body could not be encoded or decoded.
    #[snafu(display("document codec failure: {}", source))]
    Codec {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// A stored document: key plus JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document key.
    pub id: String,
    /// Document body as stored.
    pub body: Value,
}

/// One entry of the store's change stream.
///
/// Events carry the full document payload so consumers never need a
/// follow-up read. Sequence numbers are monotonically increasing per
/// subscription and define the only ordering consumers may rely on.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Local, monotonically increasing sequence number.
    pub seq: u64,
    /// Key of the changed document.
    pub id: String,
    /// Whether the document was deleted.
    pub deleted: bool,
    /// Full document body; `None` for deletions.
    pub doc: Option<Value>,
}
