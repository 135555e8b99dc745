//! Handler module - the callable half of a function descriptor.
//!
//! Provides:
//! - [`Handler`] - object-safe trait invoked with a JSON parameter payload
//! - [`FnHandler`] - wraps a closure over raw [`serde_json::Value`] parameters
//! - [`TypedHandler`] - deserializes parameters and serializes the result
//!
//! # Example
//!
//! ```
//! use serde::Deserialize;
//! use streamcall::handler::{FnHandler, Handler, TypedHandler};
//!
//! #[derive(Deserialize)]
//! struct Greet {
//!     name: String,
//! }
//!
//! let raw = FnHandler::new(|params| async move { Ok(params) });
//! let typed = TypedHandler::new(|p: Greet| async move { Ok(format!("hi {}", p.name)) });
//! # let _ = (raw, typed);
//! ```

mod typed;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::BoxError;

pub use typed::{FnHandler, TypedHandler};

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result type for handler functions.
///
/// Errors stay in their original form; the protocol wraps them in
/// [`McpError::Handler`](crate::McpError::Handler) without losing the cause.
pub type HandlerResult = std::result::Result<Value, BoxError>;

/// Trait for handler functions.
pub trait Handler: Send + Sync + 'static {
    /// Handle a call with its parameter payload.
    fn call(&self, params: Value) -> BoxFuture<'static, HandlerResult>;
}
