//! The document store trait.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::types::ChangeEvent;
use crate::types::Document;
use crate::types::Result;

/// Durable document store with a change-stream capability.
///
/// Writes are serialized per document key by the backend; the change stream
/// delivers every accepted write (and delete) with the full document payload,
/// in commit order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace the document stored under `id`.
    async fn put(&self, id: &str, body: Value) -> Result<()>;

    /// Read a document by key.
    async fn get(&self, id: &str) -> Result<Option<Document>>;

    /// Delete a document by key. Returns whether a document existed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Read every document in the store.
    async fn all_docs(&self) -> Result<Vec<Document>>;

    /// Subscribe to the change stream.
    ///
    /// Each subscription observes changes committed after the call. A lagged
    /// receiver must be treated as a broken subscription: resubscribe and
    /// rebuild from [`DocumentStore::all_docs`].
    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<T> {
    async fn put(&self, id: &str, body: Value) -> Result<()> {
        (**self).put(id, body).await
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        (**self).get(id).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        (**self).delete(id).await
    }

    async fn all_docs(&self) -> Result<Vec<Document>> {
        (**self).all_docs().await
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        (**self).changes()
    }
}
