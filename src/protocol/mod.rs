//! Protocol module - function registry and call dispatch.
//!
//! Provides:
//! - [`FunctionDescriptor`] - name, description, parameter schema, optional handler
//! - [`FunctionRegistry`] - name-unique, insertion-ordered descriptor map
//! - [`Protocol`] - lifecycle state machine gating `call`
//! - [`DefaultExecutor`] - fallback for descriptors without a handler
//!
//! # Example
//!
//! ```
//! use streamcall::protocol::{FunctionDescriptor, ParamSchema, Protocol};
//!
//! # async fn run() -> streamcall::Result<()> {
//! let protocol = Protocol::default();
//! protocol.initialize();
//!
//! protocol.register(
//!     FunctionDescriptor::new("double", "Double a number")
//!         .param("n", ParamSchema::number("Input"))
//!         .handler(|p| async move {
//!             let n = p["n"].as_i64().unwrap_or_default();
//!             Ok(serde_json::json!({ "result": n * 2 }))
//!         }),
//! );
//!
//! let out = protocol.call("double", serde_json::json!({ "n": 21 })).await?;
//! assert_eq!(out["result"], 42);
//! # Ok(())
//! # }
//! ```

mod builtin;
mod descriptor;
mod dispatcher;
mod registry;

pub use builtin::{builtin_functions, DEFAULT_ECHO_MESSAGE};
pub use descriptor::{FunctionDescriptor, FunctionInfo, FunctionKind, ParamSchema, Parameters};
pub use dispatcher::{DefaultExecutor, EchoExecutor, Protocol, ProtocolState};
pub use registry::FunctionRegistry;
