//! Materialized service profiles.
//!
//! A profile aggregates every live, receipt-backed instance of one service
//! name. Profiles are produced by the change propagator and read-only
//! everywhere else.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// One live instance inside a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInstance {
    /// Fresh id minted when the instance entered the profile.
    pub id: String,
    /// Receipt backing this instance.
    pub registration_receipt_id: String,
    /// When the instance entered the profile, ms since epoch.
    pub created_at: u64,
    /// Endpoint accepting JSON-RPC calls.
    pub rpc_endpoint: String,
    /// URN of the backing receipt.
    pub urn: String,
}

/// Aggregation of all live instances for one service name, merged with the
/// declarative manifest fields from the latest registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProfile {
    /// Service name; one profile exists per name.
    pub name: String,
    /// Declared version.
    #[serde(default)]
    pub version: String,
    /// Declared dependencies.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Declared ports.
    #[serde(default)]
    pub ports: Vec<u16>,
    /// Declared API surface (schema-bearing JSON, as registered).
    #[serde(default)]
    pub api: Value,
    /// Live instances backed by store receipts.
    #[serde(default)]
    pub instances: Vec<ProfileInstance>,
}

impl ServiceProfile {
    /// A profile with no instances yet.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            depends_on: Vec::new(),
            ports: Vec::new(),
            api: Value::Null,
            instances: Vec::new(),
        }
    }

    /// Whether an instance backed by the given receipt is present.
    pub fn has_receipt(&self, receipt_id: &str) -> bool {
        self.instances.iter().any(|i| i.registration_receipt_id == receipt_id)
    }
}
