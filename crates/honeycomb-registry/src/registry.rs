//! Receipt minting and persistence.

use std::sync::Arc;

use honeycomb_core::RegistrationReceipt;
use honeycomb_core::SignedRegistration;
use honeycomb_core::VALIDITY_WINDOW_MS;
use honeycomb_core::constants::RECEIPT_NONCE_BYTES;
use honeycomb_core::now_unix_ms;
use honeycomb_store::DocumentStore;
use rand::RngCore;
use serde_json::json;
use sha2::Digest;
use sha2::Sha256;
use tracing::info;
use uuid::Uuid;

use crate::alias::two_word_alias;
use crate::claims::decode_embedded_certificate;
use crate::error::RegistryError;
use crate::error::Result;

/// Registry for accepted service registrations.
///
/// Owns receipt minting and the single durable write per registration. The
/// store write is the commit point: if it fails, no receipt exists and the
/// registration must be retried from scratch.
pub struct ServiceRegistry<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    instance_id: String,
    instance_public_key: String,
}

impl<S: DocumentStore + ?Sized> Clone for ServiceRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            instance_id: self.instance_id.clone(),
            instance_public_key: self.instance_public_key.clone(),
        }
    }
}

impl<S: DocumentStore + ?Sized + 'static> ServiceRegistry<S> {
    /// Create a registry over a store handle.
    ///
    /// `instance_public_key` is the issuing instance's base64 public key,
    /// embedded into every receipt.
    pub fn new(store: Arc<S>, instance_id: impl Into<String>, instance_public_key: impl Into<String>) -> Self {
        Self {
            store,
            instance_id: instance_id.into(),
            instance_public_key: instance_public_key.into(),
        }
    }

    /// Accept a registration and mint its receipt.
    ///
    /// The caller has already verified the embedded certificate and the
    /// claim match; this method only mints and persists. The stored document
    /// carries the claims verbatim next to the receipt so the change feed
    /// can materialize profiles without further reads.
    pub async fn register(&self, registration: &SignedRegistration) -> Result<RegistrationReceipt> {
        let certificate = decode_embedded_certificate(registration)?;
        let created_at = now_unix_ms();
        let receipt_id = Uuid::new_v4().to_string();
        let service = &registration.payload.service;

        let mut nonce = [0u8; RECEIPT_NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut nonce);

        let receipt = RegistrationReceipt {
            receipt_id: receipt_id.clone(),
            service_id: Uuid::new_v4().to_string(),
            app: registration.payload.app.clone(),
            service_name: service.name.clone(),
            alias: two_word_alias(),
            callback_url: service.network.rpc_endpoint.clone(),
            created_at,
            expires_at: created_at + VALIDITY_WINDOW_MS,
            instance_id: self.instance_id.clone(),
            instance_public_key: self.instance_public_key.clone(),
            certificate_sha256: certificate_digest(&registration.payload.certificate),
            nonce: hex_encode(&nonce),
            urn: RegistrationReceipt::urn_for(&receipt_id),
        };

        let claims = json!({
            "app": registration.payload.app,
            "name": service.name,
            "version": service.version,
            "dependsOn": service.depends_on,
            "ports": service.ports,
            "api": service.api,
            "network": service.network,
        });
        let receipt_value = serde_json::to_value(&receipt).map_err(|source| RegistryError::ReceiptMalformed { source })?;
        let document = json!({
            "claims": claims,
            "receipt": receipt_value,
        });

        self.store
            .put(&receipt_id, document)
            .await
            .map_err(|source| RegistryError::Persistence { source })?;

        info!(
            receipt_id = %receipt.receipt_id,
            service = %receipt.service_name,
            alias = %receipt.alias,
            "registered service"
        );
        Ok(receipt)
    }

    /// List every receipt currently present in the store.
    pub async fn list_services(&self) -> Result<Vec<RegistrationReceipt>> {
        let docs = self.store.all_docs().await.map_err(|source| RegistryError::Persistence { source })?;
        let mut receipts = Vec::with_capacity(docs.len());
        for doc in docs {
            let Some(raw) = doc.body.get("receipt") else {
                // Foreign documents may share the database; skip them.
                continue;
            };
            let receipt = serde_json::from_value(raw.clone()).map_err(|source| RegistryError::ReceiptMalformed { source })?;
            receipts.push(receipt);
        }
        Ok(receipts)
    }
}

/// Hex SHA-256 of the certificate exactly as embedded (base64-decoded bytes).
fn certificate_digest(certificate_b64: &str) -> String {
    use base64::Engine;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(certificate_b64)
        .unwrap_or_else(|_| certificate_b64.as_bytes().to_vec());
    hex_encode(&Sha256::digest(&bytes))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use honeycomb_ca::CertificateAuthority;
    use honeycomb_ca::ServiceSigner;
    use honeycomb_core::CertificateRequest;
    use honeycomb_core::ServiceManifest;
    use honeycomb_store::ChangeEvent;
    use honeycomb_store::Document;
    use honeycomb_store::MemoryDocumentStore;
    use honeycomb_store::StoreError;
    use tokio::sync::broadcast;

    use super::*;

    fn manifest() -> ServiceManifest {
        serde_json::from_value(json!({
            "name": "NOOPService",
            "version": "0.0.1",
            "dependsOn": ["CacheService"],
            "ports": [3001],
            "api": {"methods": [{"name": "hello", "params": {"type": "object"}}]},
            "network": {
                "internalOnly": false,
                "publicHostName": "noop",
                "rpcEndpoint": "http://noop_service:3001/rpc"
            }
        }))
        .unwrap()
    }

    fn registration() -> SignedRegistration {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let signer = ServiceSigner::generate().unwrap();
        let certificate = ca
            .generate_certificate(CertificateRequest {
                app: "current.ly".into(),
                service: manifest(),
                public_key: signer.public_key_b64().unwrap(),
            })
            .unwrap();
        signer.sign_registration("current.ly", manifest(), &certificate).unwrap()
    }

    #[tokio::test]
    async fn register_mints_complete_receipt() {
        let store = Arc::new(MemoryDocumentStore::new());
        let registry = ServiceRegistry::new(store, "instance-1", "instance-key");

        let receipt = registry.register(&registration()).await.unwrap();

        assert_eq!(receipt.service_name, "NOOPService");
        assert_eq!(receipt.app, "current.ly");
        assert_eq!(receipt.callback_url, "http://noop_service:3001/rpc");
        assert_eq!(receipt.expires_at - receipt.created_at, VALIDITY_WINDOW_MS);
        assert_eq!(receipt.instance_id, "instance-1");
        assert_eq!(receipt.nonce.len(), RECEIPT_NONCE_BYTES * 2);
        assert_eq!(receipt.certificate_sha256.len(), 64);
        assert!(receipt.urn.ends_with(&receipt.receipt_id));

        let parts: Vec<&str> = receipt.alias.split('-').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_lowercase())));
    }

    #[tokio::test]
    async fn stored_document_carries_claims_and_receipt() {
        let store = Arc::new(MemoryDocumentStore::new());
        let registry = ServiceRegistry::new(Arc::clone(&store), "instance-1", "instance-key");

        let receipt = registry.register(&registration()).await.unwrap();
        let doc = store.get(&receipt.receipt_id).await.unwrap().unwrap();

        assert_eq!(doc.body["claims"]["name"], "NOOPService");
        assert_eq!(doc.body["claims"]["network"]["rpcEndpoint"], "http://noop_service:3001/rpc");
        assert_eq!(doc.body["receipt"]["receiptId"], receipt.receipt_id.as_str());
    }

    #[tokio::test]
    async fn list_services_returns_persisted_receipts() {
        let store = Arc::new(MemoryDocumentStore::new());
        let registry = ServiceRegistry::new(store, "instance-1", "instance-key");

        let first = registry.register(&registration()).await.unwrap();
        let second = registry.register(&registration()).await.unwrap();

        let mut ids: Vec<String> = registry.list_services().await.unwrap().into_iter().map(|r| r.receipt_id).collect();
        ids.sort();
        let mut expected = vec![first.receipt_id, second.receipt_id];
        expected.sort();
        assert_eq!(ids, expected);
    }

    /// Store that refuses every write.
    struct FailingStore;

    #[async_trait]
    impl honeycomb_store::DocumentStore for FailingStore {
        async fn put(&self, _id: &str, _body: serde_json::Value) -> honeycomb_store::Result<()> {
            Err(StoreError::Failed {
                reason: "write refused".to_string(),
            })
        }

        async fn get(&self, _id: &str) -> honeycomb_store::Result<Option<Document>> {
            Ok(None)
        }

        async fn delete(&self, _id: &str) -> honeycomb_store::Result<bool> {
            Ok(false)
        }

        async fn all_docs(&self) -> honeycomb_store::Result<Vec<Document>> {
            Ok(Vec::new())
        }

        fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
            broadcast::channel(1).1
        }
    }

    #[tokio::test]
    async fn store_failure_fails_registration() {
        let registry = ServiceRegistry::new(Arc::new(FailingStore), "instance-1", "instance-key");
        let err = registry.register(&registration()).await.unwrap_err();
        assert!(matches!(err, RegistryError::Persistence { .. }));
    }
}
