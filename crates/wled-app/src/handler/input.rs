//! Dial input handlers
//!
//! Press opens and commits the mode menu, rotation either moves the menu
//! highlight or changes the device, and a tap soft-toggles power.

use tokio::time::Instant;
use wled_core::prelude::*;

use crate::session::SessionHandle;
use crate::state::AppState;

use super::{UpdateAction, UpdateResult};

/// Handle a dial press
pub fn handle_press(state: &mut AppState, context: String) -> UpdateResult {
    let Some(handle) = state.sessions.get_mut(&context) else {
        return UpdateResult::none();
    };

    if handle.session.selecting {
        handle.cancel_selection_timer();
        let mode = handle.session.commit_menu();
        info!("[{}] mode set to {}", context, mode.label());
        return UpdateResult::action(UpdateAction::PersistSettings {
            context: context.clone(),
            settings: handle.session.settings.clone(),
        })
        .with(UpdateAction::Render { context });
    }

    handle.session.open_menu();
    debug!("[{}] mode menu opened", context);
    rearm_selection_timer(handle).with(UpdateAction::Render { context })
}

/// Handle a dial rotation
pub fn handle_rotate(state: &mut AppState, context: String, ticks: i32) -> UpdateResult {
    let step = state.config.input.brightness_step;
    let Some(handle) = state.sessions.get_mut(&context) else {
        return UpdateResult::none();
    };

    if handle.session.selecting {
        handle.session.cycle_pending(ticks);
        return rearm_selection_timer(handle).with(UpdateAction::Render { context });
    }

    let Some(address) = handle.session.address.clone() else {
        return UpdateResult::none();
    };
    match handle.session.rotate(ticks, step) {
        Some(patch) => UpdateResult::action(UpdateAction::SendCommand {
            context: context.clone(),
            address,
            patch,
        })
        .with(UpdateAction::Render { context }),
        None => UpdateResult::none(),
    }
}

/// Handle a touch-strip tap
pub fn handle_tap(state: &mut AppState, context: String, now: Instant) -> UpdateResult {
    let input = &state.config.input;
    let (debounce, default_brightness) = (input.toggle_debounce(), input.default_restore_brightness);
    let Some(handle) = state.sessions.get_mut(&context) else {
        return UpdateResult::none();
    };
    let Some(address) = handle.session.address.clone() else {
        return UpdateResult::none();
    };

    match handle.session.toggle_power(now, debounce, default_brightness) {
        Some(patch) => UpdateResult::action(UpdateAction::SendCommand {
            context: context.clone(),
            address,
            patch,
        })
        .with(UpdateAction::Render { context }),
        None => {
            trace!("[{}] tap ignored", context);
            UpdateResult::none()
        }
    }
}

/// Close the menu without committing when its timer fires.
///
/// A timeout carrying an old token was superseded by later input.
pub fn handle_selection_timeout(state: &mut AppState, context: String, token: u64) -> UpdateResult {
    let Some(handle) = state.sessions.get_mut(&context) else {
        return UpdateResult::none();
    };
    if !handle.session.selecting || handle.session.selection_token != token {
        return UpdateResult::none();
    }

    handle.selection_task = None;
    handle.session.cancel_menu();
    debug!("[{}] mode menu timed out", context);
    UpdateResult::action(UpdateAction::Render { context })
}

fn rearm_selection_timer(handle: &mut SessionHandle) -> UpdateResult {
    handle.cancel_selection_timer();
    UpdateResult::action(UpdateAction::ArmSelectionTimeout {
        context: handle.session.context.clone(),
        token: handle.session.selection_token,
    })
}
