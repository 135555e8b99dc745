//! Functions - discovery and a custom default executor.
//!
//! This example demonstrates:
//! - Listing registered functions as JSON
//! - Replacing the default executor for handler-less descriptors
//! - Streaming a plain function through the single-call fallback

use serde_json::{json, Value};
use streamcall::handler::{BoxFuture, HandlerResult};
use streamcall::protocol::DefaultExecutor;
use streamcall::{FunctionDescriptor, Manager, ParamSchema};
use tracing_subscriber::EnvFilter;

/// Executor that acknowledges every call it receives.
struct Acknowledge;

impl DefaultExecutor for Acknowledge {
    fn execute(&self, name: &str, params: Value) -> BoxFuture<'static, HandlerResult> {
        tracing::info!(function = %name, "Acknowledging call");
        let ack = json!({ "acknowledged": name, "received": params });
        Box::pin(async move { Ok(ack) })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let manager = Manager::builder().default_executor(Acknowledge).build();
    manager.start();

    manager.register(
        FunctionDescriptor::new("notify", "Queue a notification")
            .param("channel", ParamSchema::string("Target channel").with_default("general")),
    );

    println!("{}", serde_json::to_string_pretty(&manager.list())?);

    let envelopes = manager
        .stream("notify", json!({ "channel": "ops" }))?
        .collect()
        .await?;
    for envelope in envelopes {
        println!("{}", serde_json::to_string(&envelope)?);
    }

    manager.stop();
    Ok(())
}
