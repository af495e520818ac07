//! Action handlers: UpdateAction dispatch and background task spawning

use std::sync::Arc;

use tokio::sync::mpsc;
use wled_core::prelude::*;
use wled_device::DeviceClient;

use crate::display::{self, RenderOptions};
use crate::host::HostBridge;
use crate::message::Message;
use crate::state::AppState;
use crate::UpdateAction;

pub(crate) mod command;
pub(crate) mod polling;
pub(crate) mod scan;
pub(crate) mod selection;

pub use polling::poll_device;

/// Execute an action.
///
/// Long-lived tasks are stored on the owning session so teardown can abort
/// them. An action for a context that no longer exists is dropped.
pub fn handle_action<C, H>(
    state: &mut AppState,
    action: UpdateAction,
    msg_tx: &mpsc::Sender<Message>,
    client: &Arc<C>,
    host: &H,
) where
    C: DeviceClient + Send + Sync + 'static,
    H: HostBridge + ?Sized,
{
    match action {
        UpdateAction::StartPolling {
            context,
            address,
            generation,
        } => {
            let interval = state.config.polling.interval();
            let Some(handle) = state.sessions.get_mut(&context) else {
                return;
            };
            if let Some(previous) = handle.poll_task.take() {
                previous.abort();
            }
            handle.poll_task = Some(polling::spawn_poll_loop(
                Arc::clone(client),
                context,
                address,
                generation,
                interval,
                msg_tx.clone(),
            ));
        }

        UpdateAction::ArmSelectionTimeout { context, token } => {
            let timeout = state.config.input.selection_timeout();
            let Some(handle) = state.sessions.get_mut(&context) else {
                return;
            };
            if let Some(previous) = handle.selection_task.take() {
                previous.abort();
            }
            handle.selection_task = Some(selection::spawn_selection_timer(
                context,
                token,
                timeout,
                msg_tx.clone(),
            ));
        }

        UpdateAction::SendCommand {
            context,
            address,
            patch,
        } => {
            command::spawn_send_command(Arc::clone(client), context, address, patch);
        }

        UpdateAction::PersistSettings { context, settings } => {
            host.set_settings(&context, &settings);
        }

        UpdateAction::Render { context } => {
            let Some(handle) = state.sessions.get(&context) else {
                return;
            };
            let frame = display::compose(&handle.session);
            let options = RenderOptions::from_settings(&handle.session.settings);
            trace!("[{}] render {} / {}", context, frame.label, frame.value);
            let image = display::to_data_uri(&display::render_svg(&frame, &options));
            host.set_feedback(&context, &image);
        }

        UpdateAction::StartScan { context } => {
            scan::spawn_scan(
                Arc::clone(client),
                context,
                state.config.discovery.scan_options(),
                msg_tx.clone(),
            );
        }
    }
}
