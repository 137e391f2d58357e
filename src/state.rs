//! Shared application state for registry handlers.

use std::sync::Arc;

use honeycomb_ca::CertificateAuthority;
use honeycomb_registry::ServiceRegistry;
use honeycomb_store::DocumentStore;

use crate::config::AppConfig;

/// State shared by every registry HTTP handler.
#[derive(Clone)]
pub struct AppState {
    /// Daemon configuration.
    pub config: Arc<AppConfig>,
    /// The instance's certificate authority. All signing funnels through it.
    pub ca: Arc<CertificateAuthority>,
    /// Receipt minting and persistence.
    pub registry: ServiceRegistry<dyn DocumentStore>,
}

impl AppState {
    /// Assemble state from the daemon's long-lived components.
    pub fn new(config: AppConfig, ca: Arc<CertificateAuthority>, store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let instance_public_key = ca.public_key_b64()?;
        let registry = ServiceRegistry::new(store, config.instance.instance_id.clone(), instance_public_key);
        Ok(Self {
            config: Arc::new(config),
            ca,
            registry,
        })
    }
}
