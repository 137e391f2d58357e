//! The Honeycomb client.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use honeycomb_core::RegistrationReceipt;
use honeycomb_core::ServiceProfile;
use honeycomb_core::SignedRegistration;
use honeycomb_core::now_unix_ms;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;
use tracing::warn;

use crate::constants::CONTROL_PLANE_TIMEOUT;
use crate::constants::DEFAULT_RPC_TIMEOUT;
use crate::dispatch::ServiceHandle;
use crate::envelope::Envelope;
use crate::error::ClientError;
use crate::error::Result;
use crate::route_table::RouteTable;
use crate::route_table::SyncInfo;

/// Client for one Honeycomb instance, addressed through its gateway.
///
/// Registration talks to the control-plane endpoints; dispatch reads the
/// locally synced route table and calls service instances directly.
pub struct HoneycombClient {
    http: reqwest::Client,
    gateway_url: String,
    table: Arc<Mutex<RouteTable>>,
    sync: Mutex<Option<SyncInfo>>,
    rpc_timeout: Duration,
}

impl HoneycombClient {
    /// Create a client against a gateway base URL.
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
            table: Arc::new(Mutex::new(RouteTable::default())),
            sync: Mutex::new(None),
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    /// Override the per-call RPC timeout.
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    /// Register a service with the instance.
    ///
    /// First presents the embedded certificate to the verify endpoint, then
    /// submits the signed registration. Returns the minted receipt.
    pub async fn register(&self, registration: &SignedRegistration) -> Result<RegistrationReceipt> {
        let certificate = decode_certificate(registration)?;
        let certificate_id = certificate
            .pointer("/payload/metadata/certificateId")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Encoding {
                reason: "embedded certificate has no certificateId".to_string(),
            })?
            .to_string();

        let verify_url = format!("{}/api/v1/certs/{}/verify", self.gateway_url, certificate_id);
        let response = self
            .http
            .post(&verify_url)
            .timeout(CONTROL_PLANE_TIMEOUT)
            .json(&certificate)
            .send()
            .await
            .map_err(|e| ClientError::Unreachable {
                reason: e.to_string(),
            })?;
        if response.status() != reqwest::StatusCode::NO_CONTENT {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                operation: "certificate verification".to_string(),
                status,
                detail,
            });
        }

        let register_url = format!("{}/api/v1/services", self.gateway_url);
        let response = self
            .http
            .post(&register_url)
            .timeout(CONTROL_PLANE_TIMEOUT)
            .json(registration)
            .send()
            .await
            .map_err(|e| ClientError::Unreachable {
                reason: e.to_string(),
            })?;
        if response.status() != reqwest::StatusCode::CREATED {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                operation: "service registration".to_string(),
                status,
                detail,
            });
        }

        let receipt: RegistrationReceipt = response.json().await.map_err(|e| ClientError::MalformedResponse {
            operation: "service registration".to_string(),
            reason: e.to_string(),
        })?;
        info!(receipt_id = %receipt.receipt_id, service = %receipt.service_name, "service registered");
        Ok(receipt)
    }

    /// Sync the route table from the gateway, once.
    ///
    /// Idempotent: the first call fetches `/api/v1/profiles` and rebuilds the
    /// table atomically; later calls return the memoized [`SyncInfo`].
    /// Concurrent first callers serialize on one critical section. Never
    /// fails: a fetch error yields a `Stale` result.
    pub async fn ready(&self) -> SyncInfo {
        let mut memo = self.sync.lock().await;
        if let Some(info) = memo.as_ref() {
            return info.clone();
        }
        let info = self.sync_routes().await;
        *memo = Some(info.clone());
        info
    }

    /// Force a new profile fetch, replacing the memoized sync.
    pub async fn refresh(&self) -> SyncInfo {
        let mut memo = self.sync.lock().await;
        let info = self.sync_routes().await;
        *memo = Some(info.clone());
        info
    }

    async fn sync_routes(&self) -> SyncInfo {
        let url = format!("{}/api/v1/profiles", self.gateway_url);
        let fetched: std::result::Result<Vec<ServiceProfile>, String> = async {
            let response = self
                .http
                .get(&url)
                .timeout(CONTROL_PLANE_TIMEOUT)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if !response.status().is_success() {
                return Err(format!("profile fetch returned {}", response.status()));
            }
            response.json().await.map_err(|e| e.to_string())
        }
        .await;

        let now = now_unix_ms();
        let mut table = self.table.lock().await;
        match fetched {
            Ok(profiles) => {
                table.rebuild(profiles, now);
                info!(services = table.service_names().len(), "route table synced");
            }
            Err(reason) => {
                warn!(%reason, "profile sync failed, routes are stale");
                table.mark_stale(now);
            }
        }
        SyncInfo {
            ready_at: now,
            services: table.service_names(),
            status: table.status(),
        }
    }

    /// Handle for dispatching calls to a named service.
    ///
    /// Binding is late: an unknown name yields `HC2_ROUTE_NOT_FOUND`
    /// envelopes at call time rather than an error here.
    pub fn service(&self, name: impl Into<String>) -> ServiceHandle {
        ServiceHandle {
            http: self.http.clone(),
            table: Arc::clone(&self.table),
            service: name.into(),
            rpc_timeout: self.rpc_timeout,
        }
    }

    /// One-shot dispatch entry point for dynamic callers.
    pub async fn invoke(&self, service: &str, method: &str, params: Value) -> Envelope {
        self.service(service).call(method, params).await
    }
}

fn decode_certificate(registration: &SignedRegistration) -> Result<Value> {
    let raw = BASE64.decode(&registration.payload.certificate).map_err(|e| ClientError::Encoding {
        reason: format!("certificate base64 decode failed: {}", e),
    })?;
    serde_json::from_slice(&raw).map_err(|e| ClientError::Encoding {
        reason: format!("certificate envelope decode failed: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::Router;
    use axum::routing::get;
    use axum::routing::post;
    use serde_json::json;

    use super::*;
    use crate::envelope::ErrorCode;
    use crate::route_table::RouteStatus;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn profile_fixture(rpc_endpoint: &str) -> Value {
        json!([{
            "name": "NOOPService",
            "version": "0.0.1",
            "dependsOn": [],
            "ports": [3001],
            "api": {"methods": [
                {"name": "hello", "params": {"type": "object"}, "retryable": true},
                {"name": "strict", "params": {"type": "object"}}
            ]},
            "instances": [{
                "id": "i1",
                "registrationReceiptId": "r1",
                "createdAt": 1,
                "rpcEndpoint": rpc_endpoint,
                "urn": "urn:hcp:hc2:service-registration-receipt:r1"
            }]
        }])
    }

    #[tokio::test]
    async fn dispatch_before_ready_reports_route_not_found() {
        let client = HoneycombClient::new("http://127.0.0.1:1");
        let envelope = client.invoke("NOOPService", "hello", json!({"receiver": "host"})).await;

        assert!(envelope.has_error);
        assert!(envelope.data.is_none());
        let error = envelope.error.unwrap();
        assert_eq!(error.code, ErrorCode::RouteNotFound);
        assert!(error.retryable);
        assert_eq!(serde_json::to_value(error.source).unwrap(), "sdk");
    }

    #[tokio::test]
    async fn ready_is_idempotent_and_memoizes() {
        let profiles = profile_fixture("http://127.0.0.1:1/rpc");
        let gateway = Router::new().route(
            "/api/v1/profiles",
            get(move || {
                let profiles = profiles.clone();
                async move { Json(profiles) }
            }),
        );
        let base = serve(gateway).await;

        let client = HoneycombClient::new(base);
        let first = client.ready().await;
        assert_eq!(first.status, RouteStatus::Fresh);
        assert_eq!(first.services, vec!["NOOPService"]);

        let second = client.ready().await;
        assert_eq!(second.ready_at, first.ready_at);
        assert_eq!(second.services, first.services);
    }

    #[tokio::test]
    async fn failed_sync_is_stale_but_not_an_error() {
        let client = HoneycombClient::new("http://127.0.0.1:1");
        let info = client.ready().await;
        assert_eq!(info.status, RouteStatus::Stale);
        assert!(info.services.is_empty());
    }

    #[tokio::test]
    async fn known_method_dispatches_to_instance() {
        let rpc = Router::new().route(
            "/rpc",
            post(|Json(request): Json<Value>| async move {
                assert_eq!(request["method"], "NOOPService.hello");
                Json(json!({
                    "jsonrpc": "2.0",
                    "result": {"greeting": format!("hello, {}", request["params"]["receiver"].as_str().unwrap())},
                    "id": request["id"]
                }))
            }),
        );
        let rpc_base = serve(rpc).await;

        let profiles = profile_fixture(&format!("{}/rpc", rpc_base));
        let gateway = Router::new().route(
            "/api/v1/profiles",
            get(move || {
                let profiles = profiles.clone();
                async move { Json(profiles) }
            }),
        );
        let base = serve(gateway).await;

        let client = HoneycombClient::new(base);
        client.ready().await;

        let envelope = client.invoke("NOOPService", "hello", json!({"receiver": "host"})).await;
        assert!(!envelope.has_error);
        assert_eq!(envelope.data.unwrap()["greeting"], "hello, host");
    }

    #[tokio::test]
    async fn unknown_method_reports_method_not_found() {
        let profiles = profile_fixture("http://127.0.0.1:1/rpc");
        let gateway = Router::new().route(
            "/api/v1/profiles",
            get(move || {
                let profiles = profiles.clone();
                async move { Json(profiles) }
            }),
        );
        let base = serve(gateway).await;

        let client = HoneycombClient::new(base);
        client.ready().await;

        let envelope = client.invoke("NOOPService", "nonexistent", json!({})).await;
        assert_eq!(envelope.error.unwrap().code, ErrorCode::MethodNotFound);
    }

    #[tokio::test]
    async fn retryable_method_exhausts_instances_then_reports() {
        // Instance endpoint that is never listening.
        let profiles = profile_fixture("http://127.0.0.1:1/rpc");
        let gateway = Router::new().route(
            "/api/v1/profiles",
            get(move || {
                let profiles = profiles.clone();
                async move { Json(profiles) }
            }),
        );
        let base = serve(gateway).await;

        let client = HoneycombClient::new(base).with_rpc_timeout(Duration::from_millis(500));
        client.ready().await;

        let envelope = client.invoke("NOOPService", "hello", json!({"receiver": "host"})).await;
        assert_eq!(envelope.error.unwrap().code, ErrorCode::AllInstancesFailed);
    }

    #[tokio::test]
    async fn non_retryable_method_fails_fast() {
        let profiles = profile_fixture("http://127.0.0.1:1/rpc");
        let gateway = Router::new().route(
            "/api/v1/profiles",
            get(move || {
                let profiles = profiles.clone();
                async move { Json(profiles) }
            }),
        );
        let base = serve(gateway).await;

        let client = HoneycombClient::new(base).with_rpc_timeout(Duration::from_millis(500));
        client.ready().await;

        let envelope = client.invoke("NOOPService", "strict", json!({})).await;
        // First instance failure surfaces directly, not as exhaustion.
        assert_eq!(envelope.error.unwrap().code, ErrorCode::ServiceUnavailable);
    }
}
