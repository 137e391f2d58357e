//! JSON-RPC endpoint hosting a sandbox container.
//!
//! Accepts `POST /rpc` with `{"jsonrpc":"2.0","method":"<Service>.<method>",
//! "params":…,"id":…}` and dispatches into the container. Sandbox errors map
//! to JSON-RPC error objects; the HTTP status is always 200 for well-formed
//! requests, per the JSON-RPC convention.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;
use honeycomb_sandbox::CallArgs;
use honeycomb_sandbox::Container;
use honeycomb_sandbox::ContainerBuilder;
use honeycomb_sandbox::Module;
use honeycomb_sandbox::Policy;
use honeycomb_sandbox::SandboxError;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use tracing::debug;

use crate::cache::CacheService;
use crate::feed::FeedService;
use crate::noop::NoopService;

#[derive(Debug, Deserialize)]
struct RpcCall {
    #[serde(default)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    id: Value,
}

/// Build a container hosting the three demonstration services.
///
/// `FeedService` may reach `CacheService`; everything else is default-deny.
/// `CacheService` bootstraps eagerly so feeds never wait on first use.
pub fn demo_container() -> Container {
    ContainerBuilder::new()
        .with_module("NOOPService", |view| async move {
            Ok(Arc::new(NoopService::new(view)) as Arc<dyn Module>)
        })
        .with_module("FeedService", |view| async move {
            Ok(Arc::new(FeedService::new(view)) as Arc<dyn Module>)
        })
        .with_module("CacheService", |_view| async move {
            Ok(Arc::new(CacheService::new()) as Arc<dyn Module>)
        })
        .with_policy("FeedService", Policy::allowing(["CacheService"]))
        .with_bootstrap("CacheService")
        .build()
}

/// Build the `/rpc` router over a container.
pub fn build_rpc_router(container: Arc<Container>) -> Router {
    Router::new().route("/rpc", post(handle_rpc)).with_state(container)
}

async fn handle_rpc(State(container): State<Arc<Container>>, Json(call): Json<RpcCall>) -> Json<Value> {
    if !call.jsonrpc.is_empty() && call.jsonrpc != "2.0" {
        return Json(error_response(&call.id, -32600, "unsupported jsonrpc version"));
    }

    let Some((service, method)) = call.method.split_once('.') else {
        return Json(error_response(&call.id, -32600, "method must be '<Service>.<method>'"));
    };

    debug!(service, method, "rpc dispatch into container");
    match container.call(service, method, CallArgs::from_value(call.params)).await {
        Ok(result) => Json(json!({"jsonrpc": "2.0", "result": result, "id": call.id})),
        Err(error) => {
            let code = rpc_code(&error);
            Json(error_response(&call.id, code, &error.to_string()))
        }
    }
}

fn rpc_code(error: &SandboxError) -> i64 {
    match error {
        SandboxError::UnknownService { .. } | SandboxError::UnknownMethod { .. } => -32601,
        SandboxError::Service { .. } => -32602,
        SandboxError::PolicyViolation { .. } => -32000,
        _ => -32603,
    }
}

fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": {"code": code, "message": message},
        "id": id
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn serve() -> String {
        let container = Arc::new(demo_container());
        container.start().await;
        let router = build_rpc_router(container);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/rpc", addr)
    }

    async fn call(endpoint: &str, body: Value) -> Value {
        reqwest::Client::new().post(endpoint).json(&body).send().await.unwrap().json().await.unwrap()
    }

    #[tokio::test]
    async fn hello_round_trips_over_json_rpc() {
        let endpoint = serve().await;
        let response = call(
            &endpoint,
            json!({"jsonrpc": "2.0", "method": "NOOPService.hello", "params": {"receiver": "host"}, "id": 1}),
        )
        .await;

        assert_eq!(response["result"]["greeting"], "hello, host");
        assert_eq!(response["id"], 1);
        assert!(response.get("error").is_none());
    }

    #[tokio::test]
    async fn unknown_method_maps_to_32601() {
        let endpoint = serve().await;
        let response = call(
            &endpoint,
            json!({"jsonrpc": "2.0", "method": "NOOPService.goodbye", "params": {}, "id": 2}),
        )
        .await;
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn unknown_service_maps_to_32601() {
        let endpoint = serve().await;
        let response = call(
            &endpoint,
            json!({"jsonrpc": "2.0", "method": "GhostService.hello", "params": {}, "id": 3}),
        )
        .await;
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn bad_params_map_to_32602() {
        let endpoint = serve().await;
        let response = call(
            &endpoint,
            json!({"jsonrpc": "2.0", "method": "NOOPService.hello", "params": {}, "id": 4}),
        )
        .await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn unqualified_method_is_invalid_request() {
        let endpoint = serve().await;
        let response = call(&endpoint, json!({"jsonrpc": "2.0", "method": "hello", "params": {}, "id": 5})).await;
        assert_eq!(response["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn feed_and_cache_cooperate_over_rpc() {
        let endpoint = serve().await;

        call(
            &endpoint,
            json!({"jsonrpc": "2.0", "method": "FeedService.publish", "params": {"entry": "first"}, "id": 6}),
        )
        .await;

        let read = call(
            &endpoint,
            json!({"jsonrpc": "2.0", "method": "FeedService.read", "params": {}, "id": 7}),
        )
        .await;
        assert_eq!(read["result"]["entries"][0], "first");

        let cached = call(
            &endpoint,
            json!({"jsonrpc": "2.0", "method": "CacheService.get", "params": {"key": "feed.latest"}, "id": 8}),
        )
        .await;
        assert_eq!(cached["result"]["value"], "first");
    }
}
