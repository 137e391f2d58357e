//! The change-feed consumer task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use honeycomb_store::DocumentStore;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::reducer::apply_deletion;
use crate::reducer::apply_document;
use crate::view::ProfileView;

/// Initial delay before resubscribing after a broken feed.
const RESUBSCRIBE_BACKOFF_MIN: Duration = Duration::from_millis(200);

/// Backoff ceiling between resubscribe attempts.
const RESUBSCRIBE_BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Single consumer that folds the store's change feed into a [`ProfileView`].
///
/// Changes are applied strictly in feed order. A broken subscription (the
/// receiver lagged or the feed closed) is treated as fatal to that
/// subscription: the consumer backs off exponentially, resubscribes, and
/// rebuilds the view from a fresh scan so nothing is missed.
pub struct ChangePropagator<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    view: ProfileView,
}

impl<S: DocumentStore + ?Sized + 'static> ChangePropagator<S> {
    /// Create a propagator over a store handle, materializing into `view`.
    pub fn new(store: Arc<S>, view: ProfileView) -> Self {
        Self { store, view }
    }

    /// The view this propagator materializes into.
    pub fn view(&self) -> ProfileView {
        self.view.clone()
    }

    /// Scan the store and replace the view in one swap.
    ///
    /// Called before accepting the live feed so receipts registered before
    /// this gateway started are present from the first read.
    pub async fn bootstrap(&self) -> Result<(), honeycomb_store::StoreError> {
        let docs = self.store.all_docs().await?;
        let mut map = HashMap::new();
        for doc in &docs {
            apply_document(&mut map, &doc.id, &doc.body);
        }
        let profiles = map.len();
        self.view.replace(map).await;
        info!(documents = docs.len(), profiles, "bootstrapped profile view from store scan");
        Ok(())
    }

    /// Run the consumer until the feed closes permanently.
    ///
    /// Subscribes first, then bootstraps, so changes committed during the
    /// scan are not lost (the reducer's idempotency absorbs the overlap).
    pub async fn run(self) {
        let mut backoff = RESUBSCRIBE_BACKOFF_MIN;

        loop {
            let mut feed = self.store.changes();

            match self.bootstrap().await {
                Ok(()) => {
                    backoff = RESUBSCRIBE_BACKOFF_MIN;
                }
                Err(error) => {
                    warn!(error = %error, "bootstrap scan failed, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(RESUBSCRIBE_BACKOFF_MAX);
                    continue;
                }
            }

            loop {
                match feed.recv().await {
                    Ok(event) => {
                        debug!(seq = event.seq, id = %event.id, deleted = event.deleted, "applying change");
                        self.view
                            .update(|map| {
                                if event.deleted {
                                    apply_deletion(map, &event.id);
                                } else if let Some(body) = &event.doc {
                                    apply_document(map, &event.id, body);
                                } else {
                                    warn!(id = %event.id, "change without document payload, skipping");
                                }
                            })
                            .await;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "change feed lagged, rebuilding from scan");
                        break;
                    }
                    Err(RecvError::Closed) => {
                        info!("change feed closed, stopping propagator");
                        return;
                    }
                }
            }

            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(RESUBSCRIBE_BACKOFF_MAX);
        }
    }

    /// Spawn `run` on the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use honeycomb_ca::CertificateAuthority;
    use honeycomb_ca::ServiceSigner;
    use honeycomb_core::CertificateRequest;
    use honeycomb_core::ServiceManifest;
    use honeycomb_core::SignedRegistration;
    use honeycomb_registry::ServiceRegistry;
    use honeycomb_store::MemoryDocumentStore;
    use serde_json::json;

    use super::*;

    fn manifest(name: &str, endpoint: &str) -> ServiceManifest {
        serde_json::from_value(json!({
            "name": name,
            "version": "0.0.1",
            "api": {"methods": [{"name": "hello", "params": {"type": "object"}}]},
            "network": {"publicHostName": "svc", "rpcEndpoint": endpoint}
        }))
        .unwrap()
    }

    fn registration(name: &str, endpoint: &str) -> SignedRegistration {
        let ca = CertificateAuthority::generate("instance-1").unwrap();
        let signer = ServiceSigner::generate().unwrap();
        let certificate = ca
            .generate_certificate(CertificateRequest {
                app: "current.ly".into(),
                service: manifest(name, endpoint),
                public_key: signer.public_key_b64().unwrap(),
            })
            .unwrap();
        signer.sign_registration("current.ly", manifest(name, endpoint), &certificate).unwrap()
    }

    async fn wait_for<F, Fut>(mut condition: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..200 {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn bootstrap_scan_materializes_existing_receipts() {
        let store = Arc::new(MemoryDocumentStore::new());
        let registry = ServiceRegistry::new(Arc::clone(&store), "instance-1", "key");
        registry.register(&registration("NOOPService", "http://noop:3001/rpc")).await.unwrap();

        let propagator = ChangePropagator::new(Arc::clone(&store), ProfileView::new());
        let view = propagator.view();
        propagator.bootstrap().await.unwrap();

        let profile = view.get("NOOPService").await.unwrap();
        assert_eq!(profile.instances.len(), 1);
        assert_eq!(profile.instances[0].rpc_endpoint, "http://noop:3001/rpc");
    }

    #[tokio::test]
    async fn live_feed_adds_and_removes_instances() {
        let store = Arc::new(MemoryDocumentStore::new());
        let registry = ServiceRegistry::new(Arc::clone(&store), "instance-1", "key");

        let propagator = ChangePropagator::new(Arc::clone(&store), ProfileView::new());
        let view = propagator.view();
        let handle = propagator.spawn();

        let receipt = registry.register(&registration("NOOPService", "http://noop:3001/rpc")).await.unwrap();
        wait_for(|| {
            let view = view.clone();
            async move { view.get("NOOPService").await.is_some() }
        })
        .await;

        store.delete(&receipt.receipt_id).await.unwrap();
        wait_for(|| {
            let view = view.clone();
            async move { view.get("NOOPService").await.is_none() }
        })
        .await;

        handle.abort();
    }

    #[tokio::test]
    async fn two_registrations_yield_one_profile_with_two_instances() {
        let store = Arc::new(MemoryDocumentStore::new());
        let registry = ServiceRegistry::new(Arc::clone(&store), "instance-1", "key");

        let propagator = ChangePropagator::new(Arc::clone(&store), ProfileView::new());
        let view = propagator.view();
        let handle = propagator.spawn();

        registry.register(&registration("NOOPService", "http://a:3001/rpc")).await.unwrap();
        registry.register(&registration("NOOPService", "http://b:3001/rpc")).await.unwrap();

        wait_for(|| {
            let view = view.clone();
            async move { view.get("NOOPService").await.map(|p| p.instances.len() == 2).unwrap_or(false) }
        })
        .await;

        assert_eq!(view.len().await, 1);
        handle.abort();
    }
}
