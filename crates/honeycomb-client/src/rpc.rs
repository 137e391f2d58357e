//! JSON-RPC 2.0 transport.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a Value,
    id: String,
}

impl<'a> RpcRequest<'a> {
    pub(crate) fn new(method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id: Uuid::new_v4().to_string(),
        }
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    /// Retry-after hint advised by the failing instance, if any.
    pub(crate) fn retry_after(&self) -> Option<Duration> {
        self.data
            .as_ref()
            .and_then(|d| d.get("retryAfterMs"))
            .and_then(Value::as_u64)
            .map(Duration::from_millis)
    }
}

/// How a single RPC attempt failed.
#[derive(Debug)]
pub(crate) enum RpcFailure {
    /// The call exceeded its deadline.
    Timeout,
    /// The instance could not be reached or the response was not JSON-RPC.
    Transport(String),
    /// The instance answered with a JSON-RPC error object.
    Rpc(RpcErrorObject),
}

/// Invoke `method` with `params` against one instance endpoint.
pub(crate) async fn call(
    http: &reqwest::Client,
    endpoint: &str,
    method: &str,
    params: &Value,
    timeout: Duration,
) -> Result<Value, RpcFailure> {
    let request = RpcRequest::new(method, params);
    debug!(%endpoint, %method, id = %request.id, "dispatching rpc");

    let response = http.post(endpoint).timeout(timeout).json(&request).send().await.map_err(|e| {
        if e.is_timeout() {
            RpcFailure::Timeout
        } else {
            RpcFailure::Transport(e.to_string())
        }
    })?;

    let body: RpcResponse = response.json().await.map_err(|e| {
        if e.is_timeout() {
            RpcFailure::Timeout
        } else {
            RpcFailure::Transport(format!("malformed rpc response: {}", e))
        }
    })?;

    if let Some(error) = body.error {
        return Err(RpcFailure::Rpc(error));
    }
    Ok(body.result.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_has_jsonrpc_marker_and_fresh_id() {
        let params = json!({"receiver": "host"});
        let first = RpcRequest::new("NOOPService.hello", &params);
        let second = RpcRequest::new("NOOPService.hello", &params);

        let value = serde_json::to_value(&first).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "NOOPService.hello");
        assert_eq!(value["params"]["receiver"], "host");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn retry_after_reads_the_advised_interval() {
        let error = RpcErrorObject {
            code: -32000,
            message: "busy".into(),
            data: Some(json!({"retryAfterMs": 250})),
        };
        assert_eq!(error.retry_after(), Some(Duration::from_millis(250)));

        let bare = RpcErrorObject {
            code: -32000,
            message: "busy".into(),
            data: None,
        };
        assert_eq!(bare.retry_after(), None);
    }

    #[test]
    fn response_parses_result_or_error() {
        let ok: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0", "result": {"greeting": "hi"}, "id": "1"
        }))
        .unwrap();
        assert!(ok.result.is_some());
        assert!(ok.error.is_none());

        let failed: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0", "error": {"code": -32601, "message": "no such method"}, "id": "2"
        }))
        .unwrap();
        assert!(failed.result.is_none());
        assert_eq!(failed.error.unwrap().code, -32601);
    }
}
