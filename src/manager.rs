//! Manager builder and lifecycle.
//!
//! The [`ManagerBuilder`] provides a fluent API for configuring the default
//! executor and stream timing. The [`Manager`] composes a [`Protocol`] with a
//! [`StreamEngine`] and drives their lifecycle:
//! 1. `start` - initialize the protocol, then advertise the streaming functions
//! 2. `call` / `stream` / `list` - serve requests while running
//! 3. `stop` - shut the protocol down (clears every registration)
//!
//! The manager is an ordinary value: a transport owns it (usually behind an
//! `Arc`) and passes it to its request handlers.
//!
//! # Example
//!
//! ```
//! use streamcall::Manager;
//!
//! # async fn run() -> streamcall::Result<()> {
//! let manager = Manager::new();
//! manager.start();
//!
//! let out = manager.call("math_add", serde_json::json!({ "a": 10, "b": 15 })).await?;
//! assert_eq!(out, serde_json::json!({ "result": 25 }));
//!
//! let mut stream = manager.stream("streaming_count", serde_json::json!({ "count_to": 2, "delay": 0 }))?;
//! while let Some(envelope) = stream.next().await {
//!     let envelope = envelope?;
//!     if envelope.is_final {
//!         break;
//!     }
//! }
//!
//! manager.stop();
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::{McpError, Result};
use crate::protocol::{DefaultExecutor, EchoExecutor, FunctionDescriptor, FunctionInfo, Protocol};
use crate::stream::{
    streaming_functions, EnvelopeStream, SessionId, StreamEngine, DEFAULT_CHUNK_DELAY,
};

/// Manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Suspension before each `streaming_data` chunk.
    pub chunk_delay: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            chunk_delay: DEFAULT_CHUNK_DELAY,
        }
    }
}

/// Manager lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    NotStarted,
    Running,
    Stopped,
}

/// Builder for configuring and creating a [`Manager`].
pub struct ManagerBuilder {
    config: ManagerConfig,
    executor: Arc<dyn DefaultExecutor>,
}

impl ManagerBuilder {
    /// Create a new builder with default configuration and [`EchoExecutor`].
    pub fn new() -> Self {
        Self {
            config: ManagerConfig::default(),
            executor: Arc::new(EchoExecutor),
        }
    }

    /// Set the delay before each `streaming_data` chunk.
    ///
    /// Default: 100 ms
    pub fn chunk_delay(mut self, delay: Duration) -> Self {
        self.config.chunk_delay = delay;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the executor used for descriptors without a handler.
    pub fn default_executor(mut self, executor: impl DefaultExecutor) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    /// Build a manager in the `NotStarted` state.
    pub fn build(self) -> Manager {
        Manager {
            protocol: Arc::new(Protocol::with_executor(self.executor)),
            engine: StreamEngine::new(self.config.chunk_delay),
            state: Mutex::new(ManagerState::NotStarted),
        }
    }
}

impl Default for ManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Composition root over the protocol and the streaming engine.
pub struct Manager {
    protocol: Arc<Protocol>,
    engine: StreamEngine,
    state: Mutex<ManagerState>,
}

impl Manager {
    /// Create a manager with default configuration.
    pub fn new() -> Self {
        ManagerBuilder::new().build()
    }

    /// Create a new manager builder.
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start serving. No-op if already running.
    ///
    /// A stopped manager can be started again; the protocol is re-seeded.
    pub fn start(&self) {
        let mut state = self.lock_state();
        if *state == ManagerState::Running {
            return;
        }

        self.protocol.initialize();
        for descriptor in streaming_functions() {
            self.protocol.register(descriptor);
        }
        *state = ManagerState::Running;
        tracing::debug!("Manager started");
    }

    /// Stop serving. No-op unless running.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        if *state != ManagerState::Running {
            return;
        }

        self.protocol.shutdown();
        *state = ManagerState::Stopped;
        tracing::debug!(
            open_streams = self.engine.active_sessions(),
            "Manager stopped"
        );
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ManagerState {
        *self.lock_state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ManagerState::Running
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(McpError::NotRunning)
        }
    }

    /// Call a function once.
    ///
    /// A `null` payload is treated as `{}`.
    ///
    /// # Errors
    ///
    /// [`McpError::NotRunning`], [`McpError::FunctionNotFound`] or
    /// [`McpError::Handler`].
    pub async fn call(&self, name: &str, params: Value) -> Result<Value> {
        self.ensure_running()?;
        self.protocol.call(name, normalize(params)).await
    }

    /// Start a stream for `name`.
    ///
    /// A `null` payload is treated as `{}`.
    ///
    /// # Errors
    ///
    /// [`McpError::NotRunning`], or [`McpError::InvalidParameters`] for a
    /// built-in streaming function. Failures of the single-call fallback are
    /// yielded by the stream itself.
    pub fn stream(&self, name: &str, params: Value) -> Result<EnvelopeStream> {
        self.ensure_running()?;
        self.engine
            .stream(name, normalize(params), self.protocol.clone())
    }

    /// Ask a stream to stop at its next check point.
    ///
    /// Returns `false` if no live stream has this session ID.
    pub fn stop_stream(&self, session_id: SessionId) -> bool {
        self.engine.stop(session_id)
    }

    /// Number of streams that have not terminated yet.
    pub fn active_streams(&self) -> usize {
        self.engine.active_sessions()
    }

    /// Registered functions, or an empty list when not running.
    pub fn list(&self) -> Vec<FunctionInfo> {
        if !self.is_running() {
            return Vec::new();
        }
        self.protocol.list()
    }

    /// Register a function, replacing any previous one with the same name.
    pub fn register(&self, descriptor: FunctionDescriptor) {
        self.protocol.register(descriptor);
    }

    /// The underlying protocol.
    pub fn protocol(&self) -> &Arc<Protocol> {
        &self.protocol
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(params: Value) -> Value {
    match params {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}
