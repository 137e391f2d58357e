//! Per-method dispatch with multi-instance failover.

use std::sync::Arc;
use std::time::Duration;

use honeycomb_core::ServiceProfile;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::warn;

use crate::constants::MAX_RETRY_AFTER;
use crate::envelope::Envelope;
use crate::envelope::ErrorCode;
use crate::envelope::ErrorSource;
use crate::route_table::RouteTable;
use crate::rpc;
use crate::rpc::RpcFailure;

/// Handle for dispatching calls to one named service.
///
/// Handles are cheap to clone and bind late: the route table is consulted at
/// call time, so a handle taken before `ready()` simply reports
/// `HC2_ROUTE_NOT_FOUND` until routes exist.
#[derive(Clone)]
pub struct ServiceHandle {
    pub(crate) http: reqwest::Client,
    pub(crate) table: Arc<Mutex<RouteTable>>,
    pub(crate) service: String,
    pub(crate) rpc_timeout: Duration,
}

impl ServiceHandle {
    /// The service this handle targets.
    pub fn service_name(&self) -> &str {
        &self.service
    }

    /// Invoke a method with a JSON params object.
    ///
    /// Never fails with an `Err`; every outcome is an [`Envelope`].
    pub async fn call(&self, method: &str, params: Value) -> Envelope {
        let profile = {
            let table = self.table.lock().await;
            table.profile(&self.service).cloned()
        };

        let Some(profile) = profile else {
            return Envelope::failure(
                &self.service,
                method,
                ErrorCode::RouteNotFound,
                format!("no route for service '{}'", self.service),
                ErrorSource::Sdk,
                true,
            );
        };

        dispatch(&self.http, &profile, &self.service, method, params, self.rpc_timeout).await
    }
}

/// Walk the known instances in order until one answers.
pub(crate) async fn dispatch(
    http: &reqwest::Client,
    profile: &ServiceProfile,
    service: &str,
    method: &str,
    params: Value,
    timeout: Duration,
) -> Envelope {
    let Some(spec) = method_spec(&profile.api, method) else {
        return Envelope::failure(
            service,
            method,
            ErrorCode::MethodNotFound,
            format!("service '{}' exposes no method '{}'", service, method),
            ErrorSource::Sdk,
            false,
        );
    };

    if profile.instances.is_empty() {
        return Envelope::failure(
            service,
            method,
            ErrorCode::RouteNotFound,
            format!("no live instances for service '{}'", service),
            ErrorSource::Sdk,
            true,
        );
    }

    let rpc_method = format!("{}.{}", service, method);
    let mut last_failure: Option<Envelope> = None;

    for instance in &profile.instances {
        match rpc::call(http, &instance.rpc_endpoint, &rpc_method, &params, timeout).await {
            Ok(result) => return Envelope::success(service, method, result),
            Err(failure) => {
                debug!(
                    endpoint = %instance.rpc_endpoint,
                    method = %rpc_method,
                    "instance failed, considering failover"
                );

                let retry_after = if let RpcFailure::Rpc(error) = &failure {
                    error.retry_after()
                } else {
                    None
                };
                let envelope = failure_envelope(service, method, failure);

                if !spec.retryable {
                    return envelope;
                }
                last_failure = Some(envelope);

                if let Some(hint) = retry_after {
                    tokio::time::sleep(hint.min(MAX_RETRY_AFTER)).await;
                }
            }
        }
    }

    let detail = last_failure
        .and_then(|e| e.error)
        .map(|e| e.message)
        .unwrap_or_else(|| "no instance answered".to_string());
    warn!(service, method, "all instances failed");
    Envelope::failure(
        service,
        method,
        ErrorCode::AllInstancesFailed,
        format!("every instance of '{}' failed; last error: {}", service, detail),
        ErrorSource::Sdk,
        true,
    )
}

/// Method entry from a profile's registered API surface.
struct DispatchSpec {
    retryable: bool,
}

fn method_spec(api: &Value, method: &str) -> Option<DispatchSpec> {
    let methods = api.get("methods")?.as_array()?;
    let entry = methods.iter().find(|m| m.get("name").and_then(Value::as_str) == Some(method))?;
    Some(DispatchSpec {
        retryable: entry.get("retryable").and_then(Value::as_bool).unwrap_or(false),
    })
}

/// Map one instance failure to its envelope.
fn failure_envelope(service: &str, method: &str, failure: RpcFailure) -> Envelope {
    match failure {
        RpcFailure::Timeout => Envelope::failure(
            service,
            method,
            ErrorCode::RpcTimeout,
            "rpc call exceeded its deadline",
            ErrorSource::Sdk,
            true,
        ),
        RpcFailure::Transport(reason) => Envelope::failure(
            service,
            method,
            ErrorCode::ServiceUnavailable,
            reason,
            ErrorSource::Sdk,
            true,
        ),
        RpcFailure::Rpc(error) => {
            let (code, source, retryable) = match error.code {
                -32602 => (ErrorCode::InvalidParams, ErrorSource::Service, false),
                -32601 => (ErrorCode::MethodNotFound, ErrorSource::Service, false),
                // Remaining protocol-range codes come from the RPC plumbing.
                -32768..=-32000 => (ErrorCode::RpcError, ErrorSource::Proxy, true),
                _ => (ErrorCode::ServiceError, ErrorSource::Service, false),
            };
            Envelope::failure(service, method, code, error.message, source, retryable)
        }
    }
}
