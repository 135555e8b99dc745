//! Protocol lifecycle and call dispatch.
//!
//! A [`Protocol`] starts `Uninitialized`, becomes `Connected` on
//! [`initialize`](Protocol::initialize) (which seeds the built-in functions) and
//! ends `ShutDown` on [`shutdown`](Protocol::shutdown) (which clears the
//! registry). Calls are only accepted while `Connected`.
//!
//! Descriptors with an inline handler run that handler. Descriptors without one
//! are handed to the protocol's [`DefaultExecutor`], the single extension point
//! a protocol variant customises.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{json, Value};

use super::builtin::builtin_functions;
use super::{FunctionDescriptor, FunctionInfo, FunctionKind, FunctionRegistry};
use crate::error::{McpError, Result};
use crate::handler::{BoxFuture, HandlerResult};

/// Protocol lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    Uninitialized,
    Connected,
    ShutDown,
}

/// Fallback execution for descriptors without an inline handler.
pub trait DefaultExecutor: Send + Sync + 'static {
    /// Execute `name` with its parameter payload.
    fn execute(&self, name: &str, params: Value) -> BoxFuture<'static, HandlerResult>;
}

/// Default executor that reports the call was received.
///
/// Returns `{"function": name, "parameters": params, "executed": true}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoExecutor;

impl DefaultExecutor for EchoExecutor {
    fn execute(&self, name: &str, params: Value) -> BoxFuture<'static, HandlerResult> {
        let result = json!({
            "function": name,
            "parameters": params,
            "executed": true
        });
        Box::pin(async move { Ok(result) })
    }
}

struct Inner {
    state: ProtocolState,
    registry: FunctionRegistry,
}

/// Function registry plus dispatcher, gated by the lifecycle state.
///
/// All methods take `&self`; state and registry share one lock so a
/// registration is never observed half-applied. The lock is never held
/// across a handler's `.await`.
pub struct Protocol {
    inner: RwLock<Inner>,
    executor: Arc<dyn DefaultExecutor>,
}

impl Protocol {
    /// Create an uninitialized protocol with the given default executor.
    pub fn new(executor: impl DefaultExecutor) -> Self {
        Self::with_executor(Arc::new(executor))
    }

    /// Create an uninitialized protocol sharing an existing executor.
    pub fn with_executor(executor: Arc<dyn DefaultExecutor>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: ProtocolState::Uninitialized,
                registry: FunctionRegistry::new(),
            }),
            executor,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Transition to `Connected` and seed the built-in functions.
    pub fn initialize(&self) {
        let mut inner = self.write();
        inner.state = ProtocolState::Connected;
        for descriptor in builtin_functions() {
            inner.registry.register(descriptor);
        }
        tracing::debug!(functions = inner.registry.len(), "Protocol initialized");
    }

    /// Clear the registry and transition to `ShutDown`.
    pub fn shutdown(&self) {
        let mut inner = self.write();
        inner.state = ProtocolState::ShutDown;
        inner.registry.clear();
        tracing::debug!("Protocol shut down");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProtocolState {
        self.read().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ProtocolState::Connected
    }

    /// Insert or replace a descriptor by name.
    pub fn register(&self, descriptor: FunctionDescriptor) {
        let name = descriptor.name().to_string();
        let replaced = self.write().registry.register(descriptor);
        tracing::debug!(function = %name, replaced, "Registered function");
    }

    /// Whether a descriptor is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.read().registry.contains(name)
    }

    /// Snapshot of every descriptor's public metadata.
    pub fn list(&self) -> Vec<FunctionInfo> {
        self.read().registry.list()
    }

    /// Dispatch a call.
    ///
    /// # Errors
    ///
    /// - [`McpError::NotInitialized`] unless `Connected`
    /// - [`McpError::FunctionNotFound`] if `name` is not registered
    /// - [`McpError::Handler`] wrapping whatever the handler returned
    pub async fn call(&self, name: &str, params: Value) -> Result<Value> {
        let descriptor = {
            let inner = self.read();
            if inner.state != ProtocolState::Connected {
                return Err(McpError::NotInitialized);
            }
            inner
                .registry
                .get(name)
                .ok_or_else(|| McpError::FunctionNotFound(name.to_string()))?
        };

        let fut = match descriptor.kind() {
            FunctionKind::Inline(handler) => handler.call(params),
            FunctionKind::Default => self.executor.execute(name, params),
        };

        fut.await.map_err(|source| {
            tracing::error!(function = %name, error = %source, "Handler failed");
            McpError::Handler {
                function: name.to_string(),
                source,
            }
        })
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::new(EchoExecutor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::protocol::ParamSchema;

    fn connected() -> Protocol {
        let protocol = Protocol::default();
        protocol.initialize();
        protocol
    }

    #[test]
    fn test_lifecycle_transitions() {
        let protocol = Protocol::default();
        assert_eq!(protocol.state(), ProtocolState::Uninitialized);

        protocol.initialize();
        assert_eq!(protocol.state(), ProtocolState::Connected);
        assert!(protocol.contains("echo"));
        assert!(protocol.contains("math_add"));
        assert!(protocol.contains("get_time"));

        protocol.shutdown();
        assert_eq!(protocol.state(), ProtocolState::ShutDown);
        assert!(protocol.list().is_empty());
    }

    #[tokio::test]
    async fn test_call_requires_connected() {
        let protocol = Protocol::default();
        let err = protocol.call("echo", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::NotInitialized));

        protocol.initialize();
        protocol.shutdown();
        let err = protocol.call("echo", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::NotInitialized));
    }

    #[tokio::test]
    async fn test_call_not_found() {
        let protocol = connected();

        let err = protocol.call("nonexistent", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::FunctionNotFound(ref n) if n == "nonexistent"));
    }

    #[tokio::test]
    async fn test_default_executor_fallback() {
        let protocol = connected();
        protocol.register(FunctionDescriptor::new("plain", "No handler"));

        let out = protocol.call("plain", json!({"x": 1})).await.unwrap();
        assert_eq!(
            out,
            json!({"function": "plain", "parameters": {"x": 1}, "executed": true})
        );
    }

    #[tokio::test]
    async fn test_custom_default_executor() {
        struct Refuse;
        impl DefaultExecutor for Refuse {
            fn execute(&self, name: &str, _params: Value) -> BoxFuture<'static, HandlerResult> {
                let msg = format!("{name} has no implementation");
                Box::pin(async move { Err(BoxError::from(msg)) })
            }
        }

        let protocol = Protocol::new(Refuse);
        protocol.initialize();
        protocol.register(FunctionDescriptor::new("plain", "No handler"));

        let err = protocol.call("plain", json!({})).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Handler for 'plain' failed: plain has no implementation"
        );

        // Inline handlers are unaffected by the executor.
        let out = protocol.call("echo", json!({"message": "hi"})).await.unwrap();
        assert_eq!(out, json!({"echo": "hi"}));
    }

    #[tokio::test]
    async fn test_handler_receives_params_unchanged() {
        let protocol = connected();
        protocol.register(
            FunctionDescriptor::new("mirror", "Return the payload")
                .param("anything", ParamSchema::string("Any value"))
                .handler(|params| async move { Ok(params) }),
        );

        let params = json!({"anything": [1, {"deep": true}], "extra": null});
        let out = protocol.call("mirror", params.clone()).await.unwrap();
        assert_eq!(out, params);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let protocol = connected();
        protocol.register(
            FunctionDescriptor::new("fail", "Always fails")
                .handler(|_| async move { Err(BoxError::from("nope")) }),
        );

        let err = protocol.call("fail", json!({})).await.unwrap_err();
        match err {
            McpError::Handler { function, source } => {
                assert_eq!(function, "fail");
                assert_eq!(source.to_string(), "nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_replaces_handler() {
        let protocol = connected();
        protocol.register(
            FunctionDescriptor::new("version", "v1").handler(|_| async move { Ok(json!(1)) }),
        );
        protocol.register(
            FunctionDescriptor::new("version", "v2").handler(|_| async move { Ok(json!(2)) }),
        );

        assert_eq!(protocol.call("version", json!({})).await.unwrap(), json!(2));
        let entries: Vec<_> = protocol
            .list()
            .into_iter()
            .filter(|f| f.name == "version")
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "v2");
    }

    #[test]
    fn test_list_valid_in_any_state() {
        let protocol = Protocol::default();
        protocol.register(FunctionDescriptor::new("early", "Registered before init"));
        assert_eq!(protocol.list().len(), 1);

        protocol.initialize();
        let names: Vec<String> = protocol.list().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["early", "echo", "math_add", "get_time"]);
    }
}
