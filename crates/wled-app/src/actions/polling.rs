//! Device polling for dial sessions.
//!
//! Each configured session runs one loop: fetch `/json`, then
//! `/presets.json`, report the outcome to the TEA loop, sleep, repeat. The
//! loop ends when it is aborted or the message channel closes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wled_core::prelude::*;
use wled_core::DeviceAddress;
use wled_device::DeviceClient;

use crate::message::{Message, PollOutcome};

/// Run one poll cycle.
///
/// A failed presets fetch does not fail the cycle; the outcome carries
/// `presets: None` so the previous list is kept.
pub async fn poll_device<C: DeviceClient>(client: &C, address: &DeviceAddress) -> PollOutcome {
    let snapshot = match client.fetch_snapshot(address).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            if e.is_timeout() {
                debug!("Poll of {} timed out: {}", address, e);
            } else {
                debug!("Poll of {} failed: {}", address, e);
            }
            return PollOutcome::Failed {
                timed_out: e.is_timeout(),
                reason: e.to_string(),
            };
        }
    };

    let presets = match client.fetch_presets(address).await {
        Ok(presets) => Some(presets),
        Err(e) => {
            debug!("Presets of {} unavailable: {}", address, e);
            None
        }
    };

    PollOutcome::Updated { snapshot, presets }
}

/// Spawn the poll loop for one session.
///
/// The first cycle runs immediately. Every result is tagged with
/// `generation` so the handler can drop results from a superseded loop.
pub(super) fn spawn_poll_loop<C>(
    client: Arc<C>,
    context: String,
    address: DeviceAddress,
    generation: u64,
    interval: Duration,
    msg_tx: mpsc::Sender<Message>,
) -> JoinHandle<()>
where
    C: DeviceClient + Send + Sync + 'static,
{
    tokio::spawn(async move {
        debug!("[{}] poll loop {} started for {}", context, generation, address);
        loop {
            let outcome = poll_device(client.as_ref(), &address).await;
            let message = Message::PollCompleted {
                context: context.clone(),
                generation,
                outcome,
            };
            if msg_tx.send(message).await.is_err() {
                debug!("[{}] poll loop {} stopping: channel closed", context, generation);
                break;
            }
            tokio::time::sleep(interval).await;
        }
    })
}
