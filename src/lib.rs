//! # streamcall
//!
//! Registry, dispatch and streaming core for named remote function calls.
//!
//! Functions are registered as schema-described descriptors and can be
//! invoked once (`call`) or as a progressive sequence of envelope messages
//! (`stream`). Transport concerns such as HTTP routing and SSE framing live
//! outside this crate; it consumes a function name plus a JSON parameter
//! payload and hands back values, errors, or envelopes.
//!
//! ## Architecture
//!
//! - **Protocol**: function registry, lifecycle state machine, dispatcher with a
//!   pluggable default executor
//! - **Stream engine**: built-in streaming behaviours plus a single-call
//!   fallback, with cooperative per-session cancellation
//! - **Manager**: composition root the transport holds on to
//!
//! ## Example
//!
//! ```
//! use streamcall::{FunctionDescriptor, Manager, ParamSchema};
//!
//! #[tokio::main]
//! async fn main() -> streamcall::Result<()> {
//!     let manager = Manager::new();
//!     manager.start();
//!
//!     manager.register(
//!         FunctionDescriptor::new("greet", "Say hello")
//!             .param("name", ParamSchema::string("Who to greet"))
//!             .handler(|params| async move {
//!                 let name = params["name"].as_str().unwrap_or("world").to_string();
//!                 Ok(serde_json::json!({ "greeting": format!("hello {name}") }))
//!             }),
//!     );
//!
//!     let out = manager.call("greet", serde_json::json!({ "name": "ferris" })).await?;
//!     assert_eq!(out["greeting"], "hello ferris");
//!
//!     manager.stop();
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handler;
pub mod protocol;
pub mod stream;

mod manager;

pub use error::{BoxError, McpError, Result};
pub use manager::{Manager, ManagerBuilder, ManagerConfig, ManagerState};
pub use protocol::{FunctionDescriptor, FunctionInfo, ParamSchema, Protocol};
pub use stream::{CancelHandle, Envelope, EnvelopeKind, EnvelopeStream};
