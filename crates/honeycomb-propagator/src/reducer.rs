//! The profile reducer.
//!
//! Pure folds from registration documents into the profile map. Creation is
//! idempotent over `(service name, receipt id)`; deletion is keyed by the
//! document id, which the registry guarantees equals the receipt id.

use std::collections::HashMap;

use honeycomb_core::ProfileInstance;
use honeycomb_core::ServiceProfile;
use honeycomb_core::now_unix_ms;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Fold one registration document into the map.
///
/// Locates or creates the profile under `claims.name`, appends an instance
/// for the receipt unless one is already present, and merges the declarative
/// manifest fields from the claims. Malformed documents are logged and
/// skipped; a bad document must not stall the feed.
pub(crate) fn apply_document(map: &mut HashMap<String, ServiceProfile>, doc_id: &str, body: &Value) {
    let claims = &body["claims"];
    let receipt = &body["receipt"];

    let Some(name) = claims.get("name").and_then(Value::as_str) else {
        warn!(doc_id, "document has no claims.name, skipping");
        return;
    };
    let Some(receipt_id) = receipt.get("receiptId").and_then(Value::as_str) else {
        warn!(doc_id, "document has no receipt.receiptId, skipping");
        return;
    };
    let Some(rpc_endpoint) = claims.pointer("/network/rpcEndpoint").and_then(Value::as_str) else {
        warn!(doc_id, "document has no claims.network.rpcEndpoint, skipping");
        return;
    };

    let profile = map.entry(name.to_string()).or_insert_with(|| ServiceProfile::empty(name));

    // Declarative fields follow the latest registration.
    if let Some(version) = claims.get("version").and_then(Value::as_str) {
        profile.version = version.to_string();
    }
    if let Some(depends_on) = claims.get("dependsOn").and_then(Value::as_array) {
        profile.depends_on = depends_on.iter().filter_map(Value::as_str).map(str::to_string).collect();
    }
    if let Some(ports) = claims.get("ports").and_then(Value::as_array) {
        profile.ports = ports.iter().filter_map(Value::as_u64).map(|p| p as u16).collect();
    }
    if let Some(api) = claims.get("api") {
        profile.api = api.clone();
    }

    // At-least-once feed: a replayed creation must not duplicate.
    if profile.has_receipt(receipt_id) {
        return;
    }

    let urn = receipt.get("urn").and_then(Value::as_str).unwrap_or_default().to_string();
    profile.instances.push(ProfileInstance {
        id: Uuid::new_v4().to_string(),
        registration_receipt_id: receipt_id.to_string(),
        created_at: now_unix_ms(),
        rpc_endpoint: rpc_endpoint.to_string(),
        urn,
    });
}

/// Fold one deletion into the map.
///
/// Removes the instance backed by the deleted receipt document and drops
/// the profile once its last instance is gone.
pub(crate) fn apply_deletion(map: &mut HashMap<String, ServiceProfile>, doc_id: &str) {
    let mut emptied: Option<String> = None;
    for (name, profile) in map.iter_mut() {
        let before = profile.instances.len();
        profile.instances.retain(|i| i.registration_receipt_id != doc_id);
        if profile.instances.len() != before && profile.instances.is_empty() {
            emptied = Some(name.clone());
        }
    }
    if let Some(name) = emptied {
        map.remove(&name);
    }
}
