//! Service manifests.
//!
//! A manifest is the declarative description of a service: identity,
//! dependencies, API surface, and network reachability. Manifests travel
//! inside certificate requests, signed registrations, and materialized
//! profiles, always under their wire (camelCase) field names.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Declarative description of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceManifest {
    /// Service name, e.g. `NOOPService`.
    pub name: String,
    /// Semantic version string.
    pub version: String,
    /// Names of services this service calls into.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Ports the service listens on.
    #[serde(default)]
    pub ports: Vec<u16>,
    /// API surface: description and named methods.
    pub api: ApiSpec,
    /// Network reachability.
    pub network: NetworkSpec,
}

impl ServiceManifest {
    /// Look up a method spec by name.
    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.api.methods.iter().find(|m| m.name == name)
    }
}

/// API surface of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpec {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Named methods with parameter schemas.
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
}

/// A single named method with a JSON Schema for its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSpec {
    /// Method name as dispatched over RPC.
    pub name: String,
    /// JSON Schema constraining the parameter object.
    #[serde(default)]
    pub params: Value,
    /// Whether failed calls may be retried against another instance.
    #[serde(default)]
    pub retryable: bool,
}

/// Network reachability of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    /// Whether the service is reachable only from inside the instance.
    #[serde(default)]
    pub internal_only: bool,
    /// Public host name fronted by the gateway.
    pub public_host_name: String,
    /// Endpoint accepting JSON-RPC calls for this service.
    pub rpc_endpoint: String,
}
