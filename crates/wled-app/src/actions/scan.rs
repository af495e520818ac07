//! Network scan on behalf of the inspector

use std::sync::Arc;

use tokio::sync::mpsc;
use wled_core::prelude::*;
use wled_device::{DeviceClient, ScanOptions};

use crate::message::Message;

/// Sweep the local network and report back with `ScanCompleted`
pub(super) fn spawn_scan<C>(
    client: Arc<C>,
    context: String,
    options: ScanOptions,
    msg_tx: mpsc::Sender<Message>,
) where
    C: DeviceClient + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let devices = wled_device::scan(client.as_ref(), &options).await;
        debug!("[{}] scan finished with {} device(s)", context, devices.len());
        if msg_tx
            .send(Message::ScanCompleted { context, devices })
            .await
            .is_err()
        {
            warn!("Scan results dropped: engine stopped");
        }
    });
}
