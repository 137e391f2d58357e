//! Deterministic in-memory document store.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::sync::broadcast;

use crate::traits::DocumentStore;
use crate::types::ChangeEvent;
use crate::types::Document;
use crate::types::Result;

/// Change-feed buffer depth per subscription before a receiver lags out.
const CHANGE_BUFFER: usize = 256;

/// In-memory implementation of [`DocumentStore`] for tests and
/// single-process deployments.
///
/// Documents live in a `HashMap` without persistence. A global sequence
/// counter stamps every mutation, and each mutation is broadcast to all
/// change-feed subscribers in commit order.
///
/// # Limitations
///
/// - No persistence across restarts
/// - Single process only (no replication)
pub struct MemoryDocumentStore {
    inner: Mutex<HashMap<String, Value>>,
    seq: AtomicU64,
    feed: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        let (feed, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
            feed,
        }
    }
}

impl MemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(&self, event: ChangeEvent) {
        // No subscribers is fine; the feed only matters once a propagator
        // attaches.
        let _ = self.feed.send(event);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, id: &str, body: Value) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.insert(id.to_string(), body.clone());
        let seq = self.next_seq();
        self.publish(ChangeEvent {
            seq,
            id: id.to_string(),
            deleted: false,
            doc: Some(body),
        });
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let inner = self.inner.lock().await;
        Ok(inner.get(id).map(|body| Document {
            id: id.to_string(),
            body: body.clone(),
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let existed = inner.remove(id).is_some();
        if existed {
            let seq = self.next_seq();
            self.publish(ChangeEvent {
                seq,
                id: id.to_string(),
                deleted: true,
                doc: None,
            });
        }
        Ok(existed)
    }

    async fn all_docs(&self) -> Result<Vec<Document>> {
        let inner = self.inner.lock().await;
        let mut docs: Vec<Document> = inner
            .iter()
            .map(|(id, body)| Document {
                id: id.clone(),
                body: body.clone(),
            })
            .collect();
        // HashMap iteration order is arbitrary; scans are key-ordered so
        // consumers see a stable bootstrap sequence.
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
