//! chat-relay - main entry point
//!
//! Bridges stdin/stdout with a chat conversation: lines you type are sent
//! into the chat, new and edited chat messages are printed back. This binary
//! wires the relay engine to the in-process simulated surface (echo mode);
//! pointing it at a real browser is a `ChatSurface` implementation away.
//!
//! Type `/exit` (or press Ctrl+C) to stop. Diagnostics go to stderr so stdout
//! carries nothing but conversation content.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use chat_relay::{ChatRelay, RelayConfig, SimSurface};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs on stderr; stdout is the operator-facing conversation stream.
    let _subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting chat-relay");

    let config = RelayConfig::load();
    info!("Bridging conversation at {}", config.chat.url);

    // Ctrl+C raises the shutdown flag; the loop notices within one poll.
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })?;

    // Blocking input collection on its own thread. Empty lines are
    // discarded; everything else, the exit sentinel included, goes through
    // the queue in arrival order.
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line.trim().to_string(),
                Err(_) => break,
            };
            if line.is_empty() {
                continue;
            }
            if outgoing_tx.send(line).is_err() {
                break;
            }
        }
        debug!("input collection finished");
    });

    let surface = SimSurface::echoing();
    surface.push_incoming("Simulated chat ready. Everything you type is echoed back.");

    let mut relay = ChatRelay::new(surface, config, outgoing_rx);
    if let Err(e) = relay.run(shutdown).await {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }

    info!("Session closed");
    Ok(())
}
