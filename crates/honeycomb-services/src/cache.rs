//! The cache service: TTL'd key-value storage for sibling modules.

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use honeycomb_core::ServiceManifest;
use honeycomb_sandbox::CallArgs;
use honeycomb_sandbox::Module;
use honeycomb_sandbox::SandboxError;
use serde_json::Value;
use serde_json::json;
use tokio::sync::Mutex;

/// Default entry lifetime when the caller sets none.
const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory TTL cache exposed as a sandbox module.
///
/// State lives only for the container's lifetime; there is no persistence
/// across restarts.
#[derive(Default)]
pub struct CacheService {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CacheService {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn required_key(args: &CallArgs) -> Result<String, SandboxError> {
        args.option("key")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SandboxError::service("a 'key' string is required"))
    }
}

#[async_trait]
impl Module for CacheService {
    fn methods(&self) -> Vec<String> {
        vec!["get".to_string(), "set".to_string(), "delete".to_string()]
    }

    async fn invoke(&self, method: &str, args: CallArgs) -> Result<Value, SandboxError> {
        match method {
            "get" => {
                let key = Self::required_key(&args)?;
                let mut entries = self.entries.lock().await;
                match entries.get(&key) {
                    Some(entry) if !entry.is_expired() => Ok(json!({"found": true, "value": entry.value})),
                    Some(_) => {
                        entries.remove(&key);
                        Ok(json!({"found": false, "value": null}))
                    }
                    None => Ok(json!({"found": false, "value": null})),
                }
            }
            "set" => {
                let key = Self::required_key(&args)?;
                let value = args.option("value").cloned().unwrap_or(Value::Null);
                let ttl = args
                    .option("ttlMs")
                    .and_then(Value::as_u64)
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_TTL);
                self.entries.lock().await.insert(key, CacheEntry {
                    value,
                    expires_at: Instant::now() + ttl,
                });
                Ok(json!({"stored": true}))
            }
            "delete" => {
                let key = Self::required_key(&args)?;
                let existed = self.entries.lock().await.remove(&key).is_some();
                Ok(json!({"deleted": existed}))
            }
            other => Err(SandboxError::UnknownMethod {
                service: "CacheService".to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Registration manifest for the cache service.
pub fn cache_manifest(rpc_endpoint: &str) -> ServiceManifest {
    serde_json::from_value(json!({
        "name": "CacheService",
        "version": "0.0.1",
        "dependsOn": [],
        "ports": [3003],
        "api": {
            "description": "ttl key-value cache",
            "methods": [
                {"name": "get", "params": {"type": "object", "properties": {"key": {"type": "string"}}, "required": ["key"]}, "retryable": true},
                {"name": "set", "params": {"type": "object", "properties": {"key": {"type": "string"}, "value": {}, "ttlMs": {"type": "integer"}}, "required": ["key"]}},
                {"name": "delete", "params": {"type": "object", "properties": {"key": {"type": "string"}}, "required": ["key"]}}
            ]
        },
        "network": {
            "internalOnly": true,
            "publicHostName": "cache",
            "rpcEndpoint": rpc_endpoint
        }
    }))
    .expect("cache manifest is statically valid")
}
