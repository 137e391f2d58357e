//! The canonical result envelope.
//!
//! Every dispatch outcome is one of these. The invariant callers may lean
//! on: `data` is `null` if and only if `has_error` is set.

use honeycomb_core::now_unix_ms;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Closed set of dispatch error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// No route is known for the requested service.
    #[serde(rename = "HC2_ROUTE_NOT_FOUND")]
    RouteNotFound,
    /// The service schema lists no such method.
    #[serde(rename = "HC2_METHOD_NOT_FOUND")]
    MethodNotFound,
    /// The SDK itself failed unexpectedly.
    #[serde(rename = "HC2_SDK_INTERNAL_ERROR")]
    SdkInternalError,
    /// The instance could not be reached.
    #[serde(rename = "HC2_SERVICE_UNAVAILABLE")]
    ServiceUnavailable,
    /// The call exceeded its timeout.
    #[serde(rename = "HC2_RPC_TIMEOUT")]
    RpcTimeout,
    /// The RPC layer reported a protocol-level error.
    #[serde(rename = "HC2_RPC_ERROR")]
    RpcError,
    /// The service rejected the supplied parameters.
    #[serde(rename = "HC2_INVALID_PARAMS")]
    InvalidParams,
    /// The service reported an application-level failure.
    #[serde(rename = "HC2_SERVICE_ERROR")]
    ServiceError,
    /// Every known instance was tried and failed.
    #[serde(rename = "HC2_ALL_INSTANCES_FAILED")]
    AllInstancesFailed,
}

/// Which layer produced an envelope or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    /// The client SDK.
    Sdk,
    /// An intermediary (gateway or RPC plumbing).
    Proxy,
    /// The target service.
    Service,
}

/// Envelope metadata: which call this is and who produced the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    /// Target service name.
    pub service: String,
    /// Target method name.
    pub method: String,
    /// Layer that produced this envelope.
    pub source: ErrorSource,
    /// Production time, ms since the Unix epoch.
    pub timestamp: u64,
}

/// Error member of a failed envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error code from the closed set.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Layer that reported the failure.
    pub source: ErrorSource,
    /// Whether retrying the call may succeed.
    pub retryable: bool,
}

/// Canonical dispatch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Call and provenance metadata.
    #[serde(rename = "__metadata")]
    pub metadata: EnvelopeMetadata,
    /// Whether the call failed.
    #[serde(rename = "hasError")]
    pub has_error: bool,
    /// Result body; `null` exactly when `has_error` is set.
    pub data: Option<Value>,
    /// Failure description; `null` exactly when `has_error` is unset.
    pub error: Option<ErrorDetail>,
}

impl Envelope {
    /// Wrap a successful result produced by the target service.
    pub fn success(service: &str, method: &str, data: Value) -> Self {
        Self {
            metadata: EnvelopeMetadata {
                service: service.to_string(),
                method: method.to_string(),
                source: ErrorSource::Service,
                timestamp: now_unix_ms(),
            },
            has_error: false,
            data: Some(data),
            error: None,
        }
    }

    /// Wrap a failure.
    pub fn failure(
        service: &str,
        method: &str,
        code: ErrorCode,
        message: impl Into<String>,
        source: ErrorSource,
        retryable: bool,
    ) -> Self {
        Self {
            metadata: EnvelopeMetadata {
                service: service.to_string(),
                method: method.to_string(),
                source,
                timestamp: now_unix_ms(),
            },
            has_error: true,
            data: None,
            error: Some(ErrorDetail {
                code,
                message: message.into(),
                source,
                retryable,
            }),
        }
    }

    /// Shorthand for an SDK-internal failure.
    pub fn internal(service: &str, method: &str, message: impl Into<String>) -> Self {
        Self::failure(service, method, ErrorCode::SdkInternalError, message, ErrorSource::Sdk, false)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_satisfies_the_invariant() {
        let envelope = Envelope::success("NOOPService", "hello", json!({"greeting": "hi"}));
        assert!(!envelope.has_error);
        assert!(envelope.data.is_some());
        assert!(envelope.error.is_none());
    }

    #[test]
    fn failure_satisfies_the_invariant() {
        let envelope = Envelope::failure(
            "NOOPService",
            "hello",
            ErrorCode::RouteNotFound,
            "no instances",
            ErrorSource::Sdk,
            true,
        );
        assert!(envelope.has_error);
        assert!(envelope.data.is_none());
        let error = envelope.error.unwrap();
        assert_eq!(error.code, ErrorCode::RouteNotFound);
        assert!(error.retryable);
    }

    #[test]
    fn wire_shape_matches_the_contract() {
        let envelope = Envelope::failure(
            "NOOPService",
            "hello",
            ErrorCode::AllInstancesFailed,
            "exhausted",
            ErrorSource::Sdk,
            true,
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["__metadata"]["service"], "NOOPService");
        assert_eq!(value["__metadata"]["source"], "sdk");
        assert_eq!(value["hasError"], true);
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["error"]["code"], "HC2_ALL_INSTANCES_FAILED");
    }

    #[test]
    fn every_code_serializes_to_its_wire_name() {
        let codes = [
            (ErrorCode::RouteNotFound, "HC2_ROUTE_NOT_FOUND"),
            (ErrorCode::MethodNotFound, "HC2_METHOD_NOT_FOUND"),
            (ErrorCode::SdkInternalError, "HC2_SDK_INTERNAL_ERROR"),
            (ErrorCode::ServiceUnavailable, "HC2_SERVICE_UNAVAILABLE"),
            (ErrorCode::RpcTimeout, "HC2_RPC_TIMEOUT"),
            (ErrorCode::RpcError, "HC2_RPC_ERROR"),
            (ErrorCode::InvalidParams, "HC2_INVALID_PARAMS"),
            (ErrorCode::ServiceError, "HC2_SERVICE_ERROR"),
            (ErrorCode::AllInstancesFailed, "HC2_ALL_INSTANCES_FAILED"),
        ];
        for (code, wire) in codes {
            assert_eq!(serde_json::to_value(code).unwrap(), wire);
        }
    }
}
