//! Method interception: pre, post, and override wrappers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::error::SandboxError;
use crate::module::CallArgs;
use crate::module::Module;

/// How an interceptor wraps its target methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptMode {
    /// Runs before the original and may rewrite the arguments.
    Pre,
    /// Observes the original's arguments and result; cannot alter either.
    Post,
    /// Replaces the original, falling back to it on failure.
    Override,
}

/// A method-level interceptor attached to a module at construction.
///
/// One hook per mode; the registration's mode decides which hook runs.
/// Interceptors receive the same restricted view as their target module at
/// construction time.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Target method names this interceptor wraps.
    fn methods(&self) -> Vec<String>;

    /// Pre hook: return `Some` replacement arguments, or `None` to keep the
    /// caller's. The replacement must match the call shape (array for
    /// positional calls, object for options calls).
    async fn before(&self, _method: &str, _args: &CallArgs) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Post hook: observes arguments and result after the original ran.
    async fn after(&self, _method: &str, _args: &CallArgs, _result: &Value) -> Result<()> {
        Ok(())
    }

    /// Override hook: runs instead of the original.
    async fn around(&self, method: &str, _args: &CallArgs) -> Result<Value> {
        Err(SandboxError::service(format!("no override handler for '{}'", method)))
    }
}

/// A module wrapped with its interceptor chains.
///
/// Built once at target construction. Per method: pre hooks run in
/// registration order, at most one override applies, and post hooks observe
/// without altering the result.
pub(crate) struct InterceptedModule {
    name: String,
    inner: Arc<dyn Module>,
    pre: HashMap<String, Vec<Arc<dyn Interceptor>>>,
    post: HashMap<String, Vec<Arc<dyn Interceptor>>>,
    replace: HashMap<String, Arc<dyn Interceptor>>,
}

impl InterceptedModule {
    /// Wrap a constructed module with validated interceptors.
    ///
    /// Interceptor methods that do not exist on the target are warned about
    /// and skipped; a second override for the same method is skipped too.
    pub(crate) fn attach(
        name: impl Into<String>,
        inner: Arc<dyn Module>,
        interceptors: Vec<(InterceptMode, Arc<dyn Interceptor>)>,
    ) -> Self {
        let name = name.into();
        let known = inner.methods();
        let mut wrapped = Self {
            name,
            inner,
            pre: HashMap::new(),
            post: HashMap::new(),
            replace: HashMap::new(),
        };

        for (mode, interceptor) in interceptors {
            for method in interceptor.methods() {
                if !known.contains(&method) {
                    warn!(
                        target_module = %wrapped.name,
                        method = %method,
                        "interceptor names a method the target does not have, skipping"
                    );
                    continue;
                }
                match mode {
                    InterceptMode::Pre => {
                        wrapped.pre.entry(method).or_default().push(Arc::clone(&interceptor));
                    }
                    InterceptMode::Post => {
                        wrapped.post.entry(method).or_default().push(Arc::clone(&interceptor));
                    }
                    InterceptMode::Override => {
                        if wrapped.replace.contains_key(&method) {
                            warn!(
                                target_module = %wrapped.name,
                                method = %method,
                                "method already has an override, skipping"
                            );
                            continue;
                        }
                        wrapped.replace.insert(method, Arc::clone(&interceptor));
                    }
                }
            }
        }
        wrapped
    }

    /// Apply the pre chain to the caller's arguments.
    ///
    /// A handler error logs and keeps the current arguments; a replacement
    /// of the wrong shape aborts the call.
    async fn apply_pre(&self, method: &str, mut args: CallArgs) -> Result<CallArgs> {
        let Some(chain) = self.pre.get(method) else {
            return Ok(args);
        };
        for interceptor in chain {
            match interceptor.before(method, &args).await {
                Err(error) => {
                    warn!(
                        target_module = %self.name,
                        method,
                        error = %error,
                        "pre interceptor failed, keeping original arguments"
                    );
                }
                Ok(None) => {}
                Ok(Some(replacement)) => {
                    let positional = matches!(args, CallArgs::Positional(_));
                    match replacement {
                        Value::Object(_) if !positional => args = CallArgs::Options(replacement),
                        Value::Array(items) if positional => args = CallArgs::Positional(items),
                        other => {
                            let shape = if positional { "positional" } else { "options" };
                            return Err(SandboxError::InterceptorAborted {
                                method: method.to_string(),
                                reason: format!("{} call cannot take {} replacement", shape, kind(&other)),
                            });
                        }
                    }
                }
            }
        }
        Ok(args)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl Module for InterceptedModule {
    fn methods(&self) -> Vec<String> {
        self.inner.methods()
    }

    async fn invoke(&self, method: &str, args: CallArgs) -> Result<Value> {
        let args = self.apply_pre(method, args).await?;

        let result = match self.replace.get(method) {
            Some(interceptor) => match interceptor.around(method, &args).await {
                Ok(value) => value,
                Err(error) => {
                    warn!(
                        target_module = %self.name,
                        method,
                        error = %error,
                        "override interceptor failed, falling through to original"
                    );
                    self.inner.invoke(method, args.clone()).await?
                }
            },
            None => self.inner.invoke(method, args.clone()).await?,
        };

        if let Some(chain) = self.post.get(method) {
            for interceptor in chain {
                if let Err(error) = interceptor.after(method, &args, &result).await {
                    warn!(
                        target_module = %self.name,
                        method,
                        error = %error,
                        "post interceptor failed, result preserved"
                    );
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Echoes its arguments so tests can observe what the wrapper forwarded.
    struct EchoModule;

    #[async_trait]
    impl Module for EchoModule {
        fn methods(&self) -> Vec<String> {
            vec!["hello".to_string(), "status".to_string()]
        }

        async fn invoke(&self, method: &str, args: CallArgs) -> Result<Value> {
            match method {
                "hello" => Ok(json!({"echo": args.to_value()})),
                "status" => Ok(json!("ok")),
                other => Err(SandboxError::UnknownMethod {
                    service: "Echo".into(),
                    method: other.into(),
                }),
            }
        }
    }

    struct RewriteArgs {
        replacement: Value,
    }

    #[async_trait]
    impl Interceptor for RewriteArgs {
        fn methods(&self) -> Vec<String> {
            vec!["hello".to_string()]
        }

        async fn before(&self, _method: &str, _args: &CallArgs) -> Result<Option<Value>> {
            Ok(Some(self.replacement.clone()))
        }
    }

    struct FailingPre;

    #[async_trait]
    impl Interceptor for FailingPre {
        fn methods(&self) -> Vec<String> {
            vec!["hello".to_string()]
        }

        async fn before(&self, _method: &str, _args: &CallArgs) -> Result<Option<Value>> {
            Err(SandboxError::service("pre handler exploded"))
        }
    }

    struct Observer {
        seen: tokio::sync::Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl Interceptor for Observer {
        fn methods(&self) -> Vec<String> {
            vec!["hello".to_string()]
        }

        async fn after(&self, _method: &str, args: &CallArgs, result: &Value) -> Result<()> {
            self.seen.lock().await.push(json!({"args": args.to_value(), "result": result}));
            Ok(())
        }
    }

    struct Replacer;

    #[async_trait]
    impl Interceptor for Replacer {
        fn methods(&self) -> Vec<String> {
            vec!["hello".to_string()]
        }

        async fn around(&self, _method: &str, _args: &CallArgs) -> Result<Value> {
            Ok(json!("replaced"))
        }
    }

    struct BrokenReplacer;

    #[async_trait]
    impl Interceptor for BrokenReplacer {
        fn methods(&self) -> Vec<String> {
            vec!["hello".to_string()]
        }

        async fn around(&self, _method: &str, _args: &CallArgs) -> Result<Value> {
            Err(SandboxError::service("override exploded"))
        }
    }

    #[tokio::test]
    async fn pre_replaces_positional_args_with_array_return() {
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(
                InterceptMode::Pre,
                Arc::new(RewriteArgs {
                    replacement: json!(["smelly host", "yo mama"]),
                }),
            )],
        );

        let result = wrapped.invoke("hello", CallArgs::Positional(vec![json!("host")])).await.unwrap();
        assert_eq!(result["echo"], json!(["smelly host", "yo mama"]));
    }

    #[tokio::test]
    async fn pre_replaces_options_args_with_object_return() {
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(
                InterceptMode::Pre,
                Arc::new(RewriteArgs {
                    replacement: json!({"receiver": "rewritten"}),
                }),
            )],
        );

        let result = wrapped.invoke("hello", CallArgs::from_value(json!({"receiver": "host"}))).await.unwrap();
        assert_eq!(result["echo"], json!({"receiver": "rewritten"}));
    }

    #[tokio::test]
    async fn pre_shape_mismatch_aborts_the_call() {
        // Object replacement for a positional call.
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(
                InterceptMode::Pre,
                Arc::new(RewriteArgs {
                    replacement: json!({"not": "an array"}),
                }),
            )],
        );
        let err = wrapped.invoke("hello", CallArgs::Positional(vec![json!("host")])).await.unwrap_err();
        assert!(matches!(err, SandboxError::InterceptorAborted { .. }));

        // Scalar replacement for an options call.
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(
                InterceptMode::Pre,
                Arc::new(RewriteArgs {
                    replacement: json!(42),
                }),
            )],
        );
        let err = wrapped.invoke("hello", CallArgs::from_value(json!({"receiver": "host"}))).await.unwrap_err();
        assert!(matches!(err, SandboxError::InterceptorAborted { .. }));
    }

    #[tokio::test]
    async fn pre_failure_falls_through_with_original_args() {
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(InterceptMode::Pre, Arc::new(FailingPre))],
        );
        let result = wrapped.invoke("hello", CallArgs::Positional(vec![json!("host")])).await.unwrap();
        assert_eq!(result["echo"], json!(["host"]));
    }

    #[tokio::test]
    async fn post_observes_but_cannot_alter() {
        let observer = Arc::new(Observer {
            seen: tokio::sync::Mutex::new(Vec::new()),
        });
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(InterceptMode::Post, Arc::clone(&observer) as Arc<dyn Interceptor>)],
        );

        let result = wrapped.invoke("hello", CallArgs::Positional(vec![json!("host")])).await.unwrap();
        assert_eq!(result["echo"], json!(["host"]));

        let seen = observer.seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["args"], json!(["host"]));
        assert_eq!(seen[0]["result"]["echo"], json!(["host"]));
    }

    #[tokio::test]
    async fn override_replaces_the_original() {
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(InterceptMode::Override, Arc::new(Replacer))],
        );
        let result = wrapped.invoke("hello", CallArgs::Positional(vec![json!("host")])).await.unwrap();
        assert_eq!(result, json!("replaced"));
    }

    #[tokio::test]
    async fn failing_override_falls_through_to_original() {
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(InterceptMode::Override, Arc::new(BrokenReplacer))],
        );
        let result = wrapped.invoke("hello", CallArgs::Positional(vec![json!("host")])).await.unwrap();
        assert_eq!(result["echo"], json!(["host"]));
    }

    #[tokio::test]
    async fn second_override_for_a_method_is_skipped() {
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![
                (InterceptMode::Override, Arc::new(Replacer)),
                (InterceptMode::Override, Arc::new(BrokenReplacer)),
            ],
        );
        let result = wrapped.invoke("hello", CallArgs::Positional(vec![json!("host")])).await.unwrap();
        assert_eq!(result, json!("replaced"));
    }

    #[tokio::test]
    async fn unknown_target_method_is_skipped() {
        struct WrongMethod;

        #[async_trait]
        impl Interceptor for WrongMethod {
            fn methods(&self) -> Vec<String> {
                vec!["no_such_method".to_string()]
            }

            async fn around(&self, _method: &str, _args: &CallArgs) -> Result<Value> {
                Ok(json!("should never run"))
            }
        }

        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(InterceptMode::Override, Arc::new(WrongMethod))],
        );
        // The wrapper holds no chain for "hello"; the original runs.
        let result = wrapped.invoke("hello", CallArgs::Positional(vec![json!("host")])).await.unwrap();
        assert_eq!(result["echo"], json!(["host"]));
    }

    #[tokio::test]
    async fn unwrapped_methods_pass_straight_through() {
        let wrapped = InterceptedModule::attach(
            "Echo",
            Arc::new(EchoModule),
            vec![(InterceptMode::Override, Arc::new(Replacer))],
        );
        let result = wrapped.invoke("status", CallArgs::Positional(Vec::new())).await.unwrap();
        assert_eq!(result, json!("ok"));
    }
}
