//! Registration receipts.
//!
//! A receipt is the canonical record of an accepted registration. The
//! registry mints one per registration, persists it, and the change feed
//! carries it to every gateway.

use serde::Deserialize;
use serde::Serialize;

use crate::constants::RECEIPT_URN_PREFIX;

/// Canonical record of an accepted service registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    /// Unique receipt id; also the durable document key.
    pub receipt_id: String,
    /// Unique id minted for the registered service instance.
    pub service_id: String,
    /// Application the service belongs to.
    pub app: String,
    /// Registered service name.
    pub service_name: String,
    /// Human-friendly two-word token, e.g. `brave-otter`.
    pub alias: String,
    /// URL at which the registered service accepts calls.
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Expiry time: `created_at` plus seven days.
    pub expires_at: u64,
    /// Identity of the registering instance.
    pub instance_id: String,
    /// Base64 public key of the issuing instance.
    pub instance_public_key: String,
    /// Hex SHA-256 of the presented certificate envelope.
    pub certificate_sha256: String,
    /// 16-byte random nonce, hex encoded.
    pub nonce: String,
    /// URN naming this receipt.
    pub urn: String,
}

impl RegistrationReceipt {
    /// Build the URN for a receipt id.
    pub fn urn_for(receipt_id: &str) -> String {
        format!("{}:{}", RECEIPT_URN_PREFIX, receipt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urn_carries_prefix_and_id() {
        let urn = RegistrationReceipt::urn_for("abc-123");
        assert_eq!(urn, "urn:hcp:hc2:service-registration-receipt:abc-123");
    }

    #[test]
    fn receipt_serializes_wire_names() {
        let receipt = RegistrationReceipt {
            receipt_id: "r1".into(),
            service_id: "s1".into(),
            app: "current.ly".into(),
            service_name: "NOOPService".into(),
            alias: "brave-otter".into(),
            callback_url: "http://noop:3001/rpc".into(),
            created_at: 1,
            expires_at: 2,
            instance_id: "inst".into(),
            instance_public_key: "pk".into(),
            certificate_sha256: "aa".into(),
            nonce: "bb".into(),
            urn: RegistrationReceipt::urn_for("r1"),
        };
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["receiptId"], "r1");
        assert_eq!(value["serviceName"], "NOOPService");
        assert_eq!(value["callbackURL"], "http://noop:3001/rpc");
        assert_eq!(value["certificateSha256"], "aa");
    }
}
