//! Stream - consuming envelopes from the built-in streaming functions.
//!
//! This example demonstrates:
//! - Pulling envelopes with `stream.next()`
//! - Rendering each envelope as an SSE-style `data:` line
//! - Cancelling a stream by session ID from another task
//!
//! ```text
//! RUST_LOG=streamcall=debug cargo run --example stream
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use streamcall::Manager;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let manager = Arc::new(Manager::new());
    manager.start();

    // Chunked data, drained to the end.
    let mut data = manager.stream("streaming_data", json!({ "size": 25, "chunk_size": 10 }))?;
    while let Some(envelope) = data.next().await {
        println!("data: {}\n", serde_json::to_string(&envelope?)?);
    }

    // Counter, cancelled after a little over two progress steps.
    let mut count = manager.stream("streaming_count", json!({ "count_to": 10, "delay": 0.5 }))?;
    let session = count.session_id();
    let canceller = manager.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1200)).await;
        canceller.stop_stream(session);
    });

    while let Some(envelope) = count.next().await {
        println!("data: {}\n", serde_json::to_string(&envelope?)?);
    }
    println!("stream {session} ended, {} still open", manager.active_streams());

    manager.stop();
    Ok(())
}
