//! Echo - simple request/response example.
//!
//! This example demonstrates:
//! - Creating a manager and starting it
//! - Calling the built-in `echo` and `math_add` functions
//! - Registering a typed handler and calling it
//!
//! ```text
//! RUST_LOG=debug cargo run --example echo
//! ```

use serde::{Deserialize, Serialize};
use serde_json::json;
use streamcall::{FunctionDescriptor, Manager, ParamSchema};
use tracing_subscriber::EnvFilter;

/// Input structure for the reverse function.
#[derive(Deserialize, Debug)]
struct ReverseInput {
    text: String,
}

/// Output structure for the reverse function.
#[derive(Serialize, Debug)]
struct ReverseOutput {
    reversed: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let manager = Manager::new();
    manager.start();

    manager.register(
        FunctionDescriptor::new("reverse", "Reverse a string")
            .param("text", ParamSchema::string("Text to reverse"))
            .typed_handler(|input: ReverseInput| async move {
                Ok(ReverseOutput {
                    reversed: input.text.chars().rev().collect(),
                })
            }),
    );

    let echoed = manager.call("echo", json!({ "message": "hello" })).await?;
    println!("echo     -> {echoed}");

    let sum = manager.call("math_add", json!({ "a": 10, "b": 15 })).await?;
    println!("math_add -> {sum}");

    let reversed = manager.call("reverse", json!({ "text": "streamcall" })).await?;
    println!("reverse  -> {reversed}");

    manager.stop();
    Ok(())
}
