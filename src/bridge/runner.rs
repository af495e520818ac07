//! Stdio runner - drives the engine from host events on stdin

use std::io::BufRead;
use std::sync::Arc;

use tokio::sync::mpsc;

use wled_app::{AppConfig, Engine, HostEvent, Message};
use wled_core::prelude::*;
use wled_device::HttpDeviceClient;

use super::{OutboundEvent, StdioHost};

/// Run the stdio bridge until stdin closes or a shutdown arrives
pub async fn run_stdio(config: AppConfig) -> Result<()> {
    info!("Starting stdio host bridge");

    let client = match HttpDeviceClient::new(config.probe_timeouts()) {
        Ok(client) => client,
        Err(e) => {
            OutboundEvent::error(e.to_string(), true).write_to(&mut std::io::stdout());
            return Err(e);
        }
    };
    let host = Arc::new(StdioHost::stdout());
    let mut engine = Engine::new(config, Arc::new(client), host);

    // Host events arrive on a blocking reader thread
    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || {
        read_host_events(std::io::stdin().lock(), stdin_tx);
    });

    let signal_tx = engine.msg_sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received");
            let _ = signal_tx.send(Message::Shutdown).await;
        }
    });

    engine.run().await;
    info!("Stdio host bridge exiting");
    Ok(())
}

/// Decode one host line
pub fn parse_host_line(line: &str) -> Result<Message> {
    let event: HostEvent = serde_json::from_str(line)?;
    Ok(event.into_message())
}

/// Forward host events from `reader` until it ends, then request shutdown.
///
/// Malformed lines are logged and skipped.
pub fn read_host_events<R: BufRead>(reader: R, msg_tx: mpsc::Sender<Message>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match parse_host_line(trimmed) {
                    Ok(msg) => {
                        if msg_tx.blocking_send(msg).is_err() {
                            info!("Engine stopped, host reader exiting");
                            return;
                        }
                    }
                    Err(e) => warn!("Ignoring host line: {}", e),
                }
            }
            Err(e) => {
                error!("Failed to read host input: {}", e);
                break;
            }
        }
    }

    info!("Host input closed");
    let _ = msg_tx.blocking_send(Message::Shutdown);
}
