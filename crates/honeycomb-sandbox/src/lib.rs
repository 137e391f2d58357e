//! In-process module container for Honeycomb services.
//!
//! A container hosts named module factories behind a default-deny capability
//! boundary. Modules are constructed lazily, at most once, each receiving a
//! restricted view of the container: stable core utilities, a
//! capability-checked proxy over sibling modules, and a container-scoped
//! event bus. Interceptors ("plugins") wrap individual target methods in one
//! of three modes (pre, post, override) at construction time.
//!
//! Construction is cooperative: a module slot observed mid-construction
//! yields an error instead of recursing, and bootstrap constructors that
//! fail are logged without stopping their peers.

mod container;
mod error;
mod module;
mod plugin;
mod view;

pub use container::Container;
pub use container::ContainerBuilder;
pub use container::Policy;
pub use error::Result;
pub use error::SandboxError;
pub use module::CallArgs;
pub use module::Module;
pub use plugin::InterceptMode;
pub use plugin::Interceptor;
pub use view::CoreApi;
pub use view::Event;
pub use view::ModuleView;
