//! Client for a CouchDB-style HTTP document store.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;
use tracing::warn;

use crate::traits::DocumentStore;
use crate::types::ChangeEvent;
use crate::types::Document;
use crate::types::Result;
use crate::types::StoreError;

/// Change-feed buffer depth per subscription.
const CHANGE_BUFFER: usize = 256;

/// Long-poll timeout for one `_changes` request.
const CHANGES_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Backoff ceiling when the store is unreachable.
const PUMP_BACKOFF_MAX: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ChangesPage {
    results: Vec<ChangeRow>,
    last_seq: Value,
}

#[derive(Deserialize)]
struct ChangeRow {
    id: String,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    doc: Option<Value>,
}

#[derive(Deserialize)]
struct AllDocsPage {
    rows: Vec<AllDocsRow>,
}

#[derive(Deserialize)]
struct AllDocsRow {
    id: String,
    #[serde(default)]
    doc: Option<Value>,
}

/// HTTP client for a document store speaking the CouchDB REST dialect.
///
/// Documents live under `{base_url}/{database}/{id}`; the change stream is
/// pumped from the long-poll `_changes` endpoint (with full document
/// payloads) into a local broadcast channel. Remote sequence tokens stay
/// internal to the pump; subscribers see the local monotonic ordering.
pub struct HttpDocumentStore {
    http: reqwest::Client,
    base_url: String,
    database: String,
    seq: AtomicU64,
    feed: broadcast::Sender<ChangeEvent>,
}

impl HttpDocumentStore {
    /// Connect to a database, verifying it is reachable, and start the
    /// change-feed pump.
    pub async fn connect(base_url: impl Into<String>, database: impl Into<String>) -> Result<std::sync::Arc<Self>> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let database = database.into();
        let http = reqwest::Client::new();

        // Probe the database before accepting writes; an unreachable store
        // at boot is fatal to the caller.
        let probe = format!("{}/{}", base_url, database);
        let response = http.get(&probe).send().await.map_err(|e| StoreError::Unreachable {
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(StoreError::Failed {
                reason: format!("database probe returned {}", response.status()),
            });
        }

        let (feed, _) = broadcast::channel(CHANGE_BUFFER);
        let store = std::sync::Arc::new(Self {
            http,
            base_url,
            database,
            seq: AtomicU64::new(0),
            feed,
        });
        tokio::spawn(pump_changes(std::sync::Arc::clone(&store)));
        Ok(store)
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.database, id)
    }

    async fn current_rev(&self, id: &str) -> Result<Option<String>> {
        let response = self.http.get(self.doc_url(id)).send().await.map_err(|e| StoreError::Unreachable {
            reason: e.to_string(),
        })?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = response.json().await.map_err(|e| StoreError::Failed {
            reason: e.to_string(),
        })?;
        Ok(body.get("_rev").and_then(Value::as_str).map(str::to_string))
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn put(&self, id: &str, body: Value) -> Result<()> {
        let mut doc = body;
        if let Some(rev) = self.current_rev(id).await? {
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("_rev".to_string(), Value::String(rev));
            }
        }
        let response = self.http.put(self.doc_url(id)).json(&doc).send().await.map_err(|e| {
            StoreError::Unreachable {
                reason: e.to_string(),
            }
        })?;
        if !response.status().is_success() {
            return Err(StoreError::Failed {
                reason: format!("put {} returned {}", id, response.status()),
            });
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let response = self.http.get(self.doc_url(id)).send().await.map_err(|e| StoreError::Unreachable {
            reason: e.to_string(),
        })?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Failed {
                reason: format!("get {} returned {}", id, response.status()),
            });
        }
        let body: Value = response.json().await.map_err(|e| StoreError::Failed {
            reason: e.to_string(),
        })?;
        Ok(Some(Document {
            id: id.to_string(),
            body,
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let Some(rev) = self.current_rev(id).await? else {
            return Ok(false);
        };
        let url = format!("{}?rev={}", self.doc_url(id), rev);
        let response = self.http.delete(url).send().await.map_err(|e| StoreError::Unreachable {
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(StoreError::Failed {
                reason: format!("delete {} returned {}", id, response.status()),
            });
        }
        Ok(true)
    }

    async fn all_docs(&self) -> Result<Vec<Document>> {
        let url = format!("{}/{}/_all_docs?include_docs=true", self.base_url, self.database);
        let response = self.http.get(url).send().await.map_err(|e| StoreError::Unreachable {
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(StoreError::Failed {
                reason: format!("_all_docs returned {}", response.status()),
            });
        }
        let page: AllDocsPage = response.json().await.map_err(|e| StoreError::Failed {
            reason: e.to_string(),
        })?;
        Ok(page
            .rows
            .into_iter()
            .filter_map(|row| {
                row.doc.map(|body| Document {
                    id: row.id,
                    body,
                })
            })
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}

/// Long-poll the remote `_changes` endpoint and rebroadcast locally.
///
/// Transport failures back off exponentially up to [`PUMP_BACKOFF_MAX`] and
/// resume from the last seen remote sequence token. The pump ends when the
/// store is dropped (no subscribers and no owner remain).
async fn pump_changes(store: std::sync::Arc<HttpDocumentStore>) {
    let mut since = Value::from(0);
    let mut backoff = Duration::from_millis(250);

    loop {
        let url = format!(
            "{}/{}/_changes?feed=longpoll&include_docs=true&since={}",
            store.base_url,
            store.database,
            since_token(&since),
        );

        let page = async {
            let response = store.http.get(&url).timeout(CHANGES_POLL_TIMEOUT).send().await?;
            response.error_for_status()?.json::<ChangesPage>().await
        }
        .await;

        match page {
            Ok(page) => {
                backoff = Duration::from_millis(250);
                since = page.last_seq;
                for row in page.results {
                    let seq = store.seq.fetch_add(1, Ordering::SeqCst) + 1;
                    let delivered = store.feed.send(ChangeEvent {
                        seq,
                        id: row.id,
                        deleted: row.deleted,
                        doc: row.doc,
                    });
                    if delivered.is_err() {
                        debug!("change feed has no subscribers, continuing");
                    }
                }
            }
            Err(error) => {
                // Timeouts are the normal long-poll idle path; anything else
                // is worth a warning before backing off.
                if !error.is_timeout() {
                    warn!(error = %error, "change feed poll failed, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(PUMP_BACKOFF_MAX);
                }
            }
        }

        if std::sync::Arc::strong_count(&store) == 1 {
            debug!("store dropped, stopping change pump");
            return;
        }
    }
}

fn since_token(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
