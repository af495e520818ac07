//! Session lifecycle handlers
//!
//! Handles dials appearing and disappearing, settings pushed by the host,
//! and inspector requests.

use serde_json::Value;
use wled_core::prelude::*;
use wled_device::DiscoveredDevice;

use crate::config::ActionSettings;
use crate::session::SessionHandle;
use crate::state::AppState;

use super::{UpdateAction, UpdateResult};

/// Inspector payload `event` value that requests a network scan
pub const START_SCAN_EVENT: &str = "startScan";

/// Handle a dial becoming visible
pub fn handle_appear(
    state: &mut AppState,
    context: String,
    settings: ActionSettings,
) -> UpdateResult {
    let (handle, created) = state.sessions.get_or_create(&context, settings.clone());
    let address_changed = if created {
        true
    } else {
        handle.session.apply_settings(settings)
    };
    sync_polling(handle, address_changed)
}

/// Handle a dial going away
pub fn handle_disappear(state: &mut AppState, context: &str) -> UpdateResult {
    state.sessions.remove(context);
    UpdateResult::none()
}

/// Handle settings pushed by the host
pub fn handle_settings_changed(
    state: &mut AppState,
    context: String,
    settings: ActionSettings,
) -> UpdateResult {
    let Some(handle) = state.sessions.get_mut(&context) else {
        debug!("[{}] settings for unknown session ignored", context);
        return UpdateResult::none();
    };
    let address_changed = handle.session.apply_settings(settings);
    sync_polling(handle, address_changed)
}

/// Handle an inspector payload
pub fn handle_custom(state: &mut AppState, context: String, payload: &Value) -> UpdateResult {
    if !state.sessions.contains(&context) {
        return UpdateResult::none();
    }
    match payload.get("event").and_then(Value::as_str) {
        Some(START_SCAN_EVENT) => {
            info!("[{}] network scan requested", context);
            UpdateResult::action(UpdateAction::StartScan { context })
        }
        other => {
            debug!("[{}] ignoring inspector event {:?}", context, other);
            UpdateResult::none()
        }
    }
}

/// Record scan results in the settings mirror and persist them
pub fn handle_scan_completed(
    state: &mut AppState,
    context: String,
    devices: Vec<DiscoveredDevice>,
) -> UpdateResult {
    let Some(handle) = state.sessions.get_mut(&context) else {
        return UpdateResult::none();
    };
    info!("[{}] scan found {} device(s)", context, devices.len());
    handle.session.settings.found_devices = Some(devices);
    UpdateResult::action(UpdateAction::PersistSettings {
        settings: handle.session.settings.clone(),
        context,
    })
}

/// Start, restart or stop the poll loop to match the session's address,
/// then render.
///
/// A running loop for an unchanged address is left alone.
fn sync_polling(handle: &mut SessionHandle, address_changed: bool) -> UpdateResult {
    let context = handle.session.context.clone();
    let render = UpdateAction::Render {
        context: context.clone(),
    };

    match handle.session.address.clone() {
        Some(address) => {
            if handle.session.polling && !address_changed {
                return UpdateResult::action(render);
            }
            handle.stop_polling();
            handle.session.polling = true;
            info!("[{}] polling {}", context, address);
            UpdateResult::action(UpdateAction::StartPolling {
                context,
                address,
                generation: handle.session.poll_generation,
            })
            .with(render)
        }
        None => {
            if handle.session.polling {
                info!("[{}] no valid address, polling stopped", context);
            }
            handle.stop_polling();
            UpdateResult::action(render)
        }
    }
}
