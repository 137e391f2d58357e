//! The module trait and call-argument model.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Arguments to a module method call.
///
/// Calls are either positional (an argument list) or carry a single options
/// object. The distinction matters to pre-mode interceptors, whose returned
/// replacement must match the shape of the original call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    /// Positional argument list.
    Positional(Vec<Value>),
    /// A single options object.
    Options(Value),
}

impl CallArgs {
    /// Interpret a JSON value as call arguments.
    ///
    /// Arrays become positional lists, objects become an options object,
    /// `null` is an empty positional call, and any other scalar is a
    /// single positional argument.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => CallArgs::Positional(items),
            Value::Object(_) => CallArgs::Options(value),
            Value::Null => CallArgs::Positional(Vec::new()),
            other => CallArgs::Positional(vec![other]),
        }
    }

    /// Collapse back into one JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            CallArgs::Positional(items) => Value::Array(items.clone()),
            CallArgs::Options(value) => value.clone(),
        }
    }

    /// First positional argument, or the options object itself.
    pub fn first(&self) -> Option<&Value> {
        match self {
            CallArgs::Positional(items) => items.first(),
            CallArgs::Options(value) => Some(value),
        }
    }

    /// Named member of the options object, if this is an options call.
    pub fn option(&self, key: &str) -> Option<&Value> {
        match self {
            CallArgs::Options(value) => value.get(key),
            CallArgs::Positional(_) => None,
        }
    }
}

/// An in-process service hosted by a container.
///
/// Modules expose a fixed method set and dispatch by name. Invocation is
/// async so implementations may call siblings through their view.
#[async_trait]
pub trait Module: Send + Sync {
    /// Names of the methods this module dispatches.
    fn methods(&self) -> Vec<String>;

    /// Invoke a named method.
    async fn invoke(&self, method: &str, args: CallArgs) -> Result<Value>;
}
