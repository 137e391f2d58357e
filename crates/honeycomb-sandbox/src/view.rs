//! Restricted views handed to module constructors.

use std::sync::Arc;
use std::sync::Weak;

use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::container::ContainerCore;
use crate::error::Result;
use crate::error::SandboxError;
use crate::module::Module;
use crate::module::CallArgs;

/// Stable utilities every module may use, regardless of policy.
#[derive(Clone)]
pub struct CoreApi {
    http: reqwest::Client,
}

impl Default for CoreApi {
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl CoreApi {
    /// Hex SHA-256 of arbitrary bytes.
    pub fn hash(&self, data: &[u8]) -> String {
        let digest = Sha256::digest(data);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Fresh UUIDv4.
    pub fn uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Fetch a URL and return its body as text.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await.map_err(|e| SandboxError::Core {
            reason: e.to_string(),
        })?;
        response.text().await.map_err(|e| SandboxError::Core {
            reason: e.to_string(),
        })
    }

    /// Structured log line attributed to a module.
    pub fn log(&self, module: &str, message: &str) {
        info!(target: "honeycomb_sandbox", module, "{}", message);
    }
}

/// An event dispatched on a container's bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name.
    pub name: String,
    /// Arbitrary JSON detail.
    pub detail: Value,
}

/// The restricted view a module (or its interceptors) sees.
///
/// Sibling access goes through [`ModuleView::call`], which enforces the
/// owner's allow-list: a module with no policy entry can reach nothing.
/// The view is handed out at construction and is the module's only door
/// back into the container.
#[derive(Clone)]
pub struct ModuleView {
    pub(crate) owner: String,
    pub(crate) core: CoreApi,
    pub(crate) container: Weak<ContainerCore>,
}

impl ModuleView {
    /// Name of the module this view belongs to.
    pub fn module_name(&self) -> &str {
        &self.owner
    }

    /// Stable core utilities.
    pub fn core(&self) -> &CoreApi {
        &self.core
    }

    /// Call a sibling module's method, subject to this module's policy.
    ///
    /// Policy is checked before existence so an unauthorized caller cannot
    /// probe for unknown names.
    pub async fn call(&self, target: &str, method: &str, args: CallArgs) -> Result<Value> {
        let container = self.upgrade()?;
        container.check_policy(&self.owner, target)?;
        let module = ContainerCore::ensure(&container, target).await?;
        module.invoke(method, args).await
    }

    /// Whether this module may reach the named sibling at all.
    ///
    /// Performs the same policy check as [`ModuleView::call`] without
    /// constructing anything.
    pub fn can_access(&self, target: &str) -> Result<()> {
        let container = self.upgrade()?;
        container.check_policy(&self.owner, target)?;
        container.check_exists(target)
    }

    /// Dispatch an event on the container bus.
    pub fn dispatch_event(&self, name: impl Into<String>, detail: Value) -> Result<()> {
        let container = self.upgrade()?;
        container.dispatch_event(Event {
            name: name.into(),
            detail,
        });
        Ok(())
    }

    /// Subscribe to the container bus.
    pub fn subscribe(&self) -> Result<broadcast::Receiver<Event>> {
        Ok(self.upgrade()?.subscribe())
    }

    fn upgrade(&self) -> Result<Arc<ContainerCore>> {
        self.container.upgrade().ok_or(SandboxError::ContainerGone)
    }
}
