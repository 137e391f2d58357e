//! Error types for sandbox operations.

use snafu::Snafu;

/// Result type for sandbox operations.
pub type Result<T, E = SandboxError> = std::result::Result<T, E>;

/// Errors raised at the container and capability boundary.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum SandboxError {
    /// A module reached for a sibling its policy does not allow.
    #[snafu(display("module '{}' is not allowed to access '{}'", module, target))]
    PolicyViolation {
        /// The module that attempted the access.
        module: String,
        /// The sibling it reached for.
        target: String,
    },

    /// No module is registered under the requested name.
    #[snafu(display("unknown service '{}'", name))]
    UnknownService {
        /// The requested name.
        name: String,
    },

    /// The module exposes no such method.
    #[snafu(display("service '{}' has no method '{}'", service, method))]
    UnknownMethod {
        /// The target module.
        service: String,
        /// The requested method.
        method: String,
    },

    /// The slot is being constructed further up the current call chain.
    #[snafu(display("module '{}' is under construction", name))]
    UnderConstruction {
        /// The module being constructed.
        name: String,
    },

    /// The module's one-shot constructor failed.
    #[snafu(display("module '{}' failed to construct: {}", name, reason))]
    ConstructionFailed {
        /// The module that failed.
        name: String,
        /// Constructor failure description.
        reason: String,
    },

    /// A pre-mode interceptor returned a shape the call cannot honor.
    #[snafu(display("interceptor aborted '{}': {}", method, reason))]
    InterceptorAborted {
        /// The intercepted method.
        method: String,
        /// Why the returned shape was rejected.
        reason: String,
    },

    /// The container behind a view has shut down.
    #[snafu(display("container is gone"))]
    ContainerGone,

    /// A module reported an application-level failure.
    #[snafu(display("{}", message))]
    Service {
        /// The module's failure description.
        message: String,
    },

    /// A core utility failed (e.g. outbound fetch).
    #[snafu(display("core utility failed: {}", reason))]
    Core {
        /// Failure description.
        reason: String,
    },
}

impl SandboxError {
    /// Convenience constructor for module-reported failures.
    pub fn service(message: impl Into<String>) -> Self {
        SandboxError::Service {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_parties() {
        let err = SandboxError::PolicyViolation {
            module: "A".into(),
            target: "B".into(),
        };
        assert_eq!(err.to_string(), "module 'A' is not allowed to access 'B'");

        let err = SandboxError::UnderConstruction { name: "A".into() };
        assert!(err.to_string().contains("under construction"));
    }
}
