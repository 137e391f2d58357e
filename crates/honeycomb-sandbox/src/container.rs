//! The module container.

use std::collections::HashMap;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error::Result;
use crate::error::SandboxError;
use crate::module::CallArgs;
use crate::module::Module;
use crate::plugin::InterceptMode;
use crate::plugin::InterceptedModule;
use crate::plugin::Interceptor;
use crate::view::CoreApi;
use crate::view::Event;
use crate::view::ModuleView;

/// Event bus buffer depth.
const EVENT_BUFFER: usize = 64;

type BoxFut<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;
type ModuleFactory = Box<dyn FnOnce(ModuleView) -> BoxFut<Arc<dyn Module>> + Send>;
type InterceptorFactory = Box<dyn FnOnce(ModuleView) -> BoxFut<Arc<dyn Interceptor>> + Send>;

/// Capability policy for one module: the sibling names it may reach.
///
/// A module with no policy entry has an empty allow-set; access is denied
/// by default.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    allowed_apis: HashSet<String>,
}

impl Policy {
    /// Allow access to the given sibling names.
    pub fn allowing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_apis: names.into_iter().map(Into::into).collect(),
        }
    }

    fn allows(&self, target: &str) -> bool {
        self.allowed_apis.contains(target)
    }
}

enum SlotState {
    Empty,
    Building,
    Ready(Arc<InterceptedModule>),
    Failed(String),
}

struct Slot {
    factory: Mutex<Option<ModuleFactory>>,
    state: Mutex<SlotState>,
}

/// Shared container internals; views hold a weak reference to this.
pub(crate) struct ContainerCore {
    slots: HashMap<String, Slot>,
    policies: HashMap<String, Policy>,
    plugins: Mutex<HashMap<String, Vec<(InterceptMode, InterceptorFactory)>>>,
    events: broadcast::Sender<Event>,
    core: CoreApi,
}

impl ContainerCore {
    /// Deny-by-default capability check.
    pub(crate) fn check_policy(&self, owner: &str, target: &str) -> Result<()> {
        let allowed = self.policies.get(owner).map(|p| p.allows(target)).unwrap_or(false);
        if allowed {
            Ok(())
        } else {
            Err(SandboxError::PolicyViolation {
                module: owner.to_string(),
                target: target.to_string(),
            })
        }
    }

    pub(crate) fn check_exists(&self, target: &str) -> Result<()> {
        if self.slots.contains_key(target) {
            Ok(())
        } else {
            Err(SandboxError::UnknownService {
                name: target.to_string(),
            })
        }
    }

    pub(crate) fn dispatch_event(&self, event: Event) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    fn view_for(this: &Arc<Self>, owner: &str) -> ModuleView {
        ModuleView {
            owner: owner.to_string(),
            core: this.core.clone(),
            container: Arc::downgrade(this),
        }
    }

    /// Resolve a module, constructing it on first access.
    ///
    /// The slot is marked under-construction for the duration of its
    /// factory: re-entrant access (the constructor reaching for itself,
    /// directly or transitively) errors instead of recursing, and the
    /// factory runs at most once no matter how the access interleaves.
    pub(crate) async fn ensure(this: &Arc<Self>, name: &str) -> Result<Arc<InterceptedModule>> {
        let slot = this.slots.get(name).ok_or_else(|| SandboxError::UnknownService {
            name: name.to_string(),
        })?;

        {
            let mut state = slot.state.lock().expect("slot state lock poisoned");
            match &*state {
                SlotState::Ready(module) => return Ok(Arc::clone(module)),
                SlotState::Building => {
                    return Err(SandboxError::UnderConstruction {
                        name: name.to_string(),
                    });
                }
                SlotState::Failed(reason) => {
                    return Err(SandboxError::ConstructionFailed {
                        name: name.to_string(),
                        reason: reason.clone(),
                    });
                }
                SlotState::Empty => *state = SlotState::Building,
            }
        }

        let factory = slot.factory.lock().expect("slot factory lock poisoned").take();
        let Some(factory) = factory else {
            // Unreachable by construction: the Empty state owns the factory.
            let reason = "factory already consumed".to_string();
            *slot.state.lock().expect("slot state lock poisoned") = SlotState::Failed(reason.clone());
            return Err(SandboxError::ConstructionFailed {
                name: name.to_string(),
                reason,
            });
        };

        let view = Self::view_for(this, name);
        let constructed = factory(view).await;

        match constructed {
            Ok(module) => {
                let wrapped = Arc::new(Self::apply_plugins(this, name, module).await);
                *slot.state.lock().expect("slot state lock poisoned") = SlotState::Ready(Arc::clone(&wrapped));
                info!(module = name, "module constructed");
                Ok(wrapped)
            }
            Err(err) => {
                let reason = err.to_string();
                *slot.state.lock().expect("slot state lock poisoned") = SlotState::Failed(reason.clone());
                Err(SandboxError::ConstructionFailed {
                    name: name.to_string(),
                    reason,
                })
            }
        }
    }

    /// Construct the interceptors registered for a target and wrap it.
    ///
    /// Interceptors receive the same restricted view as the target module.
    /// A failing interceptor constructor is logged and skipped; it must not
    /// sink the target.
    async fn apply_plugins(this: &Arc<Self>, name: &str, module: Arc<dyn Module>) -> InterceptedModule {
        let registrations = this.plugins.lock().expect("plugin lock poisoned").remove(name).unwrap_or_default();

        let mut interceptors = Vec::with_capacity(registrations.len());
        for (mode, factory) in registrations {
            let view = Self::view_for(this, name);
            match factory(view).await {
                Ok(interceptor) => interceptors.push((mode, interceptor)),
                Err(err) => {
                    warn!(target_module = name, error = %err, "interceptor constructor failed, skipping");
                }
            }
        }
        InterceptedModule::attach(name, module, interceptors)
    }
}

/// Builder for a [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    modules: Vec<(String, ModuleFactory)>,
    policies: HashMap<String, Policy>,
    bootstrap: Vec<String>,
    plugins: Vec<(String, InterceptMode, InterceptorFactory)>,
}

impl ContainerBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module factory under a name.
    ///
    /// The factory runs at most once, on first access, with the module's
    /// restricted view. Registering the same name twice replaces the
    /// earlier factory.
    pub fn with_module<F, Fut>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: FnOnce(ModuleView) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Arc<dyn Module>>> + Send + 'static,
    {
        let name = name.into();
        if self.modules.iter().any(|(n, _)| n == &name) {
            warn!(module = %name, "module registered twice, replacing earlier factory");
            self.modules.retain(|(n, _)| n != &name);
        }
        self.modules.push((name, Box::new(move |view| Box::pin(factory(view)))));
        self
    }

    /// Set the capability policy for a module.
    pub fn with_policy(mut self, name: impl Into<String>, policy: Policy) -> Self {
        self.policies.insert(name.into(), policy);
        self
    }

    /// Mark a module for eager construction at container start.
    pub fn with_bootstrap(mut self, name: impl Into<String>) -> Self {
        self.bootstrap.push(name.into());
        self
    }

    /// Register an interceptor for a target module.
    pub fn with_plugin<F, Fut>(mut self, target: impl Into<String>, mode: InterceptMode, factory: F) -> Self
    where
        F: FnOnce(ModuleView) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Arc<dyn Interceptor>>> + Send + 'static,
    {
        self.plugins.push((target.into(), mode, Box::new(move |view| Box::pin(factory(view)))));
        self
    }

    /// Define all slots and produce the container.
    ///
    /// Invalid plugin registrations (empty or unknown target) are warned
    /// about and dropped. Nothing is constructed yet; call
    /// [`Container::start`] to run bootstrap modules.
    pub fn build(self) -> Container {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let module_names: HashSet<String> = self.modules.iter().map(|(n, _)| n.clone()).collect();

        let mut plugins: HashMap<String, Vec<(InterceptMode, InterceptorFactory)>> = HashMap::new();
        for (target, mode, factory) in self.plugins {
            if target.is_empty() {
                warn!("plugin with empty target rejected");
                continue;
            }
            if !module_names.contains(&target) {
                warn!(target_module = %target, "plugin targets an unknown module, rejected");
                continue;
            }
            plugins.entry(target).or_default().push((mode, factory));
        }

        let bootstrap: Vec<String> = self
            .bootstrap
            .into_iter()
            .filter(|name| {
                let known = module_names.contains(name);
                if !known {
                    warn!(module = %name, "bootstrap names an unknown module, ignored");
                }
                known
            })
            .collect();

        let slots = self
            .modules
            .into_iter()
            .map(|(name, factory)| {
                (name, Slot {
                    factory: Mutex::new(Some(factory)),
                    state: Mutex::new(SlotState::Empty),
                })
            })
            .collect();

        Container {
            core: Arc::new(ContainerCore {
                slots,
                policies: self.policies,
                plugins: Mutex::new(plugins),
                events,
                core: CoreApi::default(),
            }),
            bootstrap,
        }
    }
}

/// A running module container.
///
/// The host surface ([`Container::call`]) is not subject to module policy;
/// the capability boundary applies to inter-module access only.
pub struct Container {
    core: Arc<ContainerCore>,
    bootstrap: Vec<String>,
}

impl Container {
    /// Eagerly construct bootstrap modules, in declaration order.
    ///
    /// Runs after every slot is defined, so bootstrap constructors may call
    /// into any sibling their policy allows. One failing bootstrap is
    /// logged and does not stop the rest.
    pub async fn start(&self) {
        for name in &self.bootstrap {
            if let Err(err) = ContainerCore::ensure(&self.core, name).await {
                error!(module = %name, error = %err, "bootstrap construction failed");
            }
        }
    }

    /// Invoke a module method from the host.
    pub async fn call(&self, module: &str, method: &str, args: CallArgs) -> Result<Value> {
        let module = ContainerCore::ensure(&self.core, module).await?;
        module.invoke(method, args).await
    }

    /// Names of the modules hosted by this container, sorted.
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.core.slots.keys().cloned().collect();
        names.sort();
        names
    }

    /// Subscribe to the container's event bus.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.core.subscribe()
    }

    /// Dispatch an event on the container's bus from the host.
    pub fn dispatch_event(&self, name: impl Into<String>, detail: Value) {
        self.core.dispatch_event(Event {
            name: name.into(),
            detail,
        });
    }
}
