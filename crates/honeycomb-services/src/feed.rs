//! The feed service: an append-only in-memory feed with cached reads.

use async_trait::async_trait;
use honeycomb_core::ServiceManifest;
use honeycomb_sandbox::CallArgs;
use honeycomb_sandbox::Module;
use honeycomb_sandbox::ModuleView;
use honeycomb_sandbox::SandboxError;
use serde_json::Value;
use serde_json::json;
use tokio::sync::Mutex;

/// Most recent entries returned by `read` when no limit is given.
const DEFAULT_READ_LIMIT: usize = 20;

/// Append-only feed exposed as a sandbox module.
///
/// Publishing caches the latest entry in `CacheService` (when policy allows)
/// and announces it on the container event bus.
pub struct FeedService {
    view: ModuleView,
    entries: Mutex<Vec<Value>>,
}

impl FeedService {
    /// Construct with the module's restricted view.
    pub fn new(view: ModuleView) -> Self {
        Self {
            view,
            entries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Module for FeedService {
    fn methods(&self) -> Vec<String> {
        vec!["publish".to_string(), "read".to_string()]
    }

    async fn invoke(&self, method: &str, args: CallArgs) -> Result<Value, SandboxError> {
        match method {
            "publish" => {
                let entry = args
                    .option("entry")
                    .cloned()
                    .ok_or_else(|| SandboxError::service("publish requires an 'entry'"))?;

                let position = {
                    let mut entries = self.entries.lock().await;
                    entries.push(entry.clone());
                    entries.len()
                };

                // Best-effort: cache the latest entry for cheap reads.
                // Denied or absent cache is not an error for publishers.
                let cached = self
                    .view
                    .call(
                        "CacheService",
                        "set",
                        CallArgs::from_value(json!({"key": "feed.latest", "value": entry})),
                    )
                    .await;
                if let Err(error) = cached {
                    self.view.core().log(self.view.module_name(), &format!("latest-entry cache skipped: {}", error));
                }

                self.view.dispatch_event("feed.published", json!({"position": position}))?;
                Ok(json!({"position": position}))
            }
            "read" => {
                let limit = args
                    .option("limit")
                    .and_then(Value::as_u64)
                    .map(|l| l as usize)
                    .unwrap_or(DEFAULT_READ_LIMIT);
                let entries = self.entries.lock().await;
                let start = entries.len().saturating_sub(limit);
                Ok(json!({"entries": entries[start..].to_vec(), "total": entries.len()}))
            }
            other => Err(SandboxError::UnknownMethod {
                service: "FeedService".to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Registration manifest for the feed service.
pub fn feed_manifest(rpc_endpoint: &str) -> ServiceManifest {
    serde_json::from_value(json!({
        "name": "FeedService",
        "version": "0.0.1",
        "dependsOn": ["CacheService"],
        "ports": [3002],
        "api": {
            "description": "append-only feed",
            "methods": [
                {"name": "publish", "params": {"type": "object", "properties": {"entry": {}}, "required": ["entry"]}},
                {"name": "read", "params": {"type": "object", "properties": {"limit": {"type": "integer"}}}, "retryable": true}
            ]
        },
        "network": {
            "internalOnly": false,
            "publicHostName": "feed",
            "rpcEndpoint": rpc_endpoint
        }
    }))
    .expect("feed manifest is statically valid")
}
