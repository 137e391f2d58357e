//! The NOOP service: says hello, does nothing else.

use async_trait::async_trait;
use honeycomb_core::ServiceManifest;
use honeycomb_sandbox::CallArgs;
use honeycomb_sandbox::Module;
use honeycomb_sandbox::ModuleView;
use honeycomb_sandbox::SandboxError;
use serde_json::Value;
use serde_json::json;

/// Greets a receiver. The canonical smoke-test service.
pub struct NoopService {
    view: ModuleView,
}

impl NoopService {
    /// Construct with the module's restricted view.
    pub fn new(view: ModuleView) -> Self {
        Self { view }
    }
}

#[async_trait]
impl Module for NoopService {
    fn methods(&self) -> Vec<String> {
        vec!["hello".to_string()]
    }

    async fn invoke(&self, method: &str, args: CallArgs) -> Result<Value, SandboxError> {
        match method {
            "hello" => {
                let receiver = args
                    .option("receiver")
                    .or_else(|| args.first())
                    .and_then(Value::as_str)
                    .ok_or_else(|| SandboxError::service("hello requires a 'receiver' string"))?;
                self.view.core().log(self.view.module_name(), &format!("greeting {}", receiver));
                Ok(json!({"greeting": format!("hello, {}", receiver)}))
            }
            other => Err(SandboxError::UnknownMethod {
                service: "NOOPService".to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Registration manifest for the NOOP service.
pub fn noop_manifest(rpc_endpoint: &str) -> ServiceManifest {
    serde_json::from_value(json!({
        "name": "NOOPService",
        "version": "0.0.1",
        "dependsOn": ["CacheService"],
        "ports": [3001],
        "api": {
            "description": "does nothing, reliably",
            "methods": [{
                "name": "hello",
                "params": {
                    "type": "object",
                    "properties": {"receiver": {"type": "string"}},
                    "required": ["receiver"],
                    "additionalProperties": false
                },
                "retryable": true
            }]
        },
        "network": {
            "internalOnly": false,
            "publicHostName": "noop",
            "rpcEndpoint": rpc_endpoint
        }
    }))
    .expect("noop manifest is statically valid")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use honeycomb_sandbox::ContainerBuilder;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn hello_greets_the_receiver() {
        let container = ContainerBuilder::new()
            .with_module("NOOPService", |view| async move {
                Ok(Arc::new(NoopService::new(view)) as Arc<dyn Module>)
            })
            .build();

        let result = container
            .call("NOOPService", "hello", CallArgs::from_value(json!({"receiver": "host"})))
            .await
            .unwrap();
        assert_eq!(result["greeting"], "hello, host");
    }

    #[tokio::test]
    async fn hello_accepts_a_positional_receiver() {
        let container = ContainerBuilder::new()
            .with_module("NOOPService", |view| async move {
                Ok(Arc::new(NoopService::new(view)) as Arc<dyn Module>)
            })
            .build();

        let result = container
            .call("NOOPService", "hello", CallArgs::from_value(json!(["host"])))
            .await
            .unwrap();
        assert_eq!(result["greeting"], "hello, host");
    }

    #[tokio::test]
    async fn missing_receiver_is_a_service_error() {
        let container = ContainerBuilder::new()
            .with_module("NOOPService", |view| async move {
                Ok(Arc::new(NoopService::new(view)) as Arc<dyn Module>)
            })
            .build();

        let err = container.call("NOOPService", "hello", CallArgs::from_value(json!({}))).await.unwrap_err();
        assert!(matches!(err, SandboxError::Service { .. }));
    }

    #[test]
    fn manifest_matches_the_published_shape() {
        let manifest = noop_manifest("http://noop_service:3001/rpc");
        assert_eq!(manifest.name, "NOOPService");
        assert_eq!(manifest.depends_on, vec!["CacheService"]);
        assert!(manifest.method("hello").unwrap().retryable);
        assert_eq!(manifest.network.rpc_endpoint, "http://noop_service:3001/rpc");
    }
}
