//! Streaming engine.
//!
//! [`StreamEngine::stream`] turns a function name and parameter payload into a
//! lazy [`EnvelopeStream`]. Two behaviours are built in:
//!
//! - `streaming_count` - `start`, `count_to` x `progress`, `complete`
//! - `streaming_data` - `start`, `ceil(size / chunk_size)` x `chunk`, `complete`
//!
//! Any other name is dispatched once through the [`Protocol`] and wrapped in a
//! single terminal `result` envelope.
//!
//! # Cancellation
//!
//! Each stream owns a session in the engine's [`SessionTable`]. Once the first
//! envelope has been delivered, the session flag is checked before every
//! further envelope; a cleared flag ends the stream without a `complete`
//! envelope. A stream suspended in a delay notices only when the delay ends.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use streamcall::protocol::Protocol;
//! use streamcall::stream::StreamEngine;
//!
//! # async fn run() -> streamcall::Result<()> {
//! let protocol = Arc::new(Protocol::default());
//! protocol.initialize();
//!
//! let engine = StreamEngine::new(Duration::ZERO);
//! let mut stream = engine.stream(
//!     "streaming_count",
//!     serde_json::json!({ "count_to": 3, "delay": 0 }),
//!     protocol,
//! )?;
//!
//! while let Some(envelope) = stream.next().await {
//!     println!("{:?}", envelope?);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use serde::de::Error as _;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::session::{CancelHandle, SessionGuard, SessionId, SessionTable};
use super::Envelope;
use crate::error::{McpError, Result};
use crate::protocol::{FunctionDescriptor, ParamSchema, Protocol};

/// Name of the built-in counting stream.
pub const STREAMING_COUNT: &str = "streaming_count";

/// Name of the built-in chunked data stream.
pub const STREAMING_DATA: &str = "streaming_data";

/// Default suspension before each `streaming_data` chunk.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CountParams {
    count_to: u64,
    delay: f64,
}

impl Default for CountParams {
    fn default() -> Self {
        Self {
            count_to: 10,
            delay: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DataParams {
    size: u64,
    chunk_size: u64,
}

impl Default for DataParams {
    fn default() -> Self {
        Self {
            size: 100,
            chunk_size: 10,
        }
    }
}

fn parse<T: DeserializeOwned>(name: &str, params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|source| McpError::InvalidParameters {
        function: name.to_string(),
        source,
    })
}

/// Seconds to a sleep duration. Non-positive and NaN mean no delay.
fn delay_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

struct CountRun {
    total: u64,
    delay: Duration,
    current: u64,
    started: bool,
    done: bool,
}

impl CountRun {
    async fn step(&mut self) -> Option<Envelope> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(Envelope::start(json!({
                "message": format!("Starting count to {}", self.total)
            })));
        }
        if self.current < self.total {
            pause(self.delay).await;
            self.current += 1;
            return Some(Envelope::progress(json!({
                "current": self.current,
                "total": self.total,
                "percentage": self.current as f64 / self.total as f64 * 100.0
            })));
        }

        self.done = true;
        Some(Envelope::complete(json!({ "message": "Count completed!" })))
    }
}

struct DataRun {
    size: u64,
    chunk_size: u64,
    delay: Duration,
    offset: u64,
    started: bool,
    done: bool,
}

impl DataRun {
    async fn step(&mut self) -> Option<Envelope> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(Envelope::start(json!({
                "message": format!("Generating {} data points", self.size)
            })));
        }
        if self.offset < self.size {
            pause(self.delay).await;
            let end = self.offset.saturating_add(self.chunk_size).min(self.size);
            let items: Vec<Value> = (self.offset..end)
                .map(|id| json!({ "id": id, "value": id.saturating_mul(2) }))
                .collect();
            let chunk_number = self.offset / self.chunk_size + 1;
            self.offset = end;
            return Some(Envelope::chunk(json!({
                "items": items,
                "chunk_number": chunk_number,
                "total_chunks": self.size.div_ceil(self.chunk_size)
            })));
        }

        self.done = true;
        Some(Envelope::complete(json!({ "message": "Data generation completed!" })))
    }
}

struct CallRun {
    protocol: Arc<Protocol>,
    name: String,
    params: Option<Value>,
}

impl CallRun {
    async fn step(&mut self) -> Option<Result<Envelope>> {
        let params = self.params.take()?;
        let item = match self.protocol.call(&self.name, params).await {
            Ok(result) => Ok(Envelope::result(result)),
            Err(source) => Err(McpError::Stream {
                function: self.name.clone(),
                source: Box::new(source),
            }),
        };
        Some(item)
    }
}

enum Behavior {
    Count(CountRun),
    Data(DataRun),
    Call(CallRun),
}

impl Behavior {
    async fn step(&mut self) -> Option<Result<Envelope>> {
        match self {
            Behavior::Count(run) => run.step().await.map(Ok),
            Behavior::Data(run) => run.step().await.map(Ok),
            Behavior::Call(run) => run.step().await,
        }
    }
}

/// Lazy, ordered sequence of envelopes for one streaming call.
///
/// Pull envelopes with [`next`](EnvelopeStream::next). The stream is finished
/// once `next` returns `None` or an `Err`; its session is released at that
/// point, or when the stream is dropped.
pub struct EnvelopeStream {
    name: String,
    behavior: Behavior,
    session: Option<SessionGuard>,
    cancel: CancelHandle,
    emitted: usize,
}

impl EnvelopeStream {
    /// Session identifier, usable with [`StreamEngine::stop`].
    #[inline]
    pub fn session_id(&self) -> SessionId {
        self.cancel.session_id()
    }

    /// Token that cancels this stream.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Name of the function being streamed.
    pub fn function_name(&self) -> &str {
        &self.name
    }

    /// Whether the stream has terminated.
    pub fn is_finished(&self) -> bool {
        self.session.is_none()
    }

    fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(SessionGuard::is_active)
    }

    fn finish(&mut self) {
        self.session = None;
    }

    /// Pull the next envelope.
    ///
    /// Returns `None` once the stream has completed or was cancelled. An
    /// `Err` item is terminal.
    pub async fn next(&mut self) -> Option<Result<Envelope>> {
        if self.session.is_none() {
            return None;
        }
        if self.emitted > 0 && !self.is_active() {
            return self.cancelled();
        }

        let Some(item) = self.behavior.step().await else {
            self.finish();
            return None;
        };

        // Cancellation requested while this envelope was being produced.
        if self.emitted > 0 && !self.is_active() {
            return self.cancelled();
        }

        match &item {
            Ok(envelope) if envelope.is_final => self.finish(),
            Err(_) => self.finish(),
            Ok(_) => {}
        }
        self.emitted += 1;
        Some(item)
    }

    fn cancelled(&mut self) -> Option<Result<Envelope>> {
        tracing::debug!(
            session = self.session_id(),
            function = %self.name,
            emitted = self.emitted,
            "Stream cancelled"
        );
        self.finish();
        None
    }

    /// Drain the stream, stopping at the first error.
    pub async fn collect(mut self) -> Result<Vec<Envelope>> {
        let mut envelopes = Vec::new();
        while let Some(item) = self.next().await {
            envelopes.push(item?);
        }
        Ok(envelopes)
    }

    /// Adapt into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<Envelope>> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|item| (item, stream))
        })
    }
}

/// Produces envelope streams and tracks their sessions.
#[derive(Debug, Clone)]
pub struct StreamEngine {
    sessions: SessionTable,
    chunk_delay: Duration,
}

impl StreamEngine {
    /// Create an engine with the given `streaming_data` chunk delay.
    pub fn new(chunk_delay: Duration) -> Self {
        Self {
            sessions: SessionTable::new(),
            chunk_delay,
        }
    }

    /// Whether `name` is handled by a built-in streaming behaviour.
    pub fn is_builtin(name: &str) -> bool {
        name == STREAMING_COUNT || name == STREAMING_DATA
    }

    /// Start a stream for `name`.
    ///
    /// Nothing runs until the first [`EnvelopeStream::next`]. For the
    /// single-call fallback, dispatch errors surface as a terminal
    /// [`McpError::Stream`] item.
    ///
    /// # Errors
    ///
    /// [`McpError::InvalidParameters`] if the parameters of a built-in
    /// behaviour cannot be decoded.
    pub fn stream(
        &self,
        name: &str,
        params: Value,
        protocol: Arc<Protocol>,
    ) -> Result<EnvelopeStream> {
        let behavior = match name {
            STREAMING_COUNT => {
                let p: CountParams = parse(name, params)?;
                Behavior::Count(CountRun {
                    total: p.count_to,
                    delay: delay_from_secs(p.delay),
                    current: 0,
                    started: false,
                    done: false,
                })
            }
            STREAMING_DATA => {
                let p: DataParams = parse(name, params)?;
                if p.chunk_size == 0 {
                    return Err(McpError::InvalidParameters {
                        function: name.to_string(),
                        source: serde_json::Error::custom("chunk_size must be at least 1"),
                    });
                }
                Behavior::Data(DataRun {
                    size: p.size,
                    chunk_size: p.chunk_size,
                    delay: self.chunk_delay,
                    offset: 0,
                    started: false,
                    done: false,
                })
            }
            _ => Behavior::Call(CallRun {
                protocol,
                name: name.to_string(),
                params: Some(params),
            }),
        };

        let session = self.sessions.open();
        let cancel = session.cancel_handle();
        tracing::debug!(session = session.id(), function = %name, "Stream started");

        Ok(EnvelopeStream {
            name: name.to_string(),
            behavior,
            session: Some(session),
            cancel,
            emitted: 0,
        })
    }

    /// Ask a stream to stop at its next check point.
    ///
    /// Returns `false` if no live stream has this session ID.
    pub fn stop(&self, session_id: SessionId) -> bool {
        self.sessions.stop(session_id)
    }

    /// Number of streams that have not terminated yet.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Whether a session is still live.
    pub fn is_session_active(&self, session_id: SessionId) -> bool {
        self.sessions.contains(session_id)
    }
}

impl Default for StreamEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_DELAY)
    }
}

/// Descriptors advertising the built-in streaming behaviours in `list`.
pub fn streaming_functions() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(
            STREAMING_COUNT,
            "Stream counting numbers with configurable delay",
        )
        .param(
            "count_to",
            ParamSchema::number("Count up to this number").with_default(10),
        )
        .param(
            "delay",
            ParamSchema::number("Delay between counts in seconds").with_default(1.0),
        ),
        FunctionDescriptor::new(STREAMING_DATA, "Stream data generation in chunks")
            .param(
                "size",
                ParamSchema::number("Total number of items to generate").with_default(100),
            )
            .param(
                "chunk_size",
                ParamSchema::number("Number of items per chunk").with_default(10),
            ),
    ]
}
