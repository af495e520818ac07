//! Fire-and-forget device writes

use std::sync::Arc;

use wled_core::prelude::*;
use wled_core::DeviceAddress;
use wled_device::{DeviceClient, StatePatch};

/// Send `patch` without waiting for the device.
///
/// Failures are logged and dropped; the next poll reconciles the cache.
pub(super) fn spawn_send_command<C>(
    client: Arc<C>,
    context: String,
    address: DeviceAddress,
    patch: StatePatch,
) where
    C: DeviceClient + Send + Sync + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = client.send_state(&address, &patch).await {
            debug!("[{}] command to {} failed: {}", context, address, e);
        }
    });
}
