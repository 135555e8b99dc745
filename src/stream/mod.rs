//! Stream module - envelope sequences with session-scoped cancellation.
//!
//! Provides:
//! - [`Envelope`] - one message of a stream
//! - [`StreamEngine`] - builds [`EnvelopeStream`]s and tracks their sessions
//! - [`CancelHandle`] - cancellation token travelling with a stream

mod engine;
mod envelope;
mod session;

pub use engine::{
    streaming_functions, EnvelopeStream, StreamEngine, DEFAULT_CHUNK_DELAY, STREAMING_COUNT,
    STREAMING_DATA,
};
pub use envelope::{Envelope, EnvelopeKind};
pub use session::{CancelHandle, SessionGuard, SessionId, SessionTable};
