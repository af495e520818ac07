//! Main update function - handles state transitions (TEA pattern)

use tokio::time::Instant;

use crate::message::Message;
use crate::state::AppState;

use super::{input, lifecycle, polling, UpdateResult};

/// Process a message and update state.
///
/// `now` drives tap debouncing. Returns an optional follow-up message and
/// the actions the event loop should perform.
pub fn update(state: &mut AppState, message: Message, now: Instant) -> UpdateResult {
    match message {
        // ─────────────────────────────────────────────────────────
        // Host lifecycle
        // ─────────────────────────────────────────────────────────
        Message::Appear { context, settings } => {
            lifecycle::handle_appear(state, context, settings)
        }
        Message::Disappear { context } => lifecycle::handle_disappear(state, &context),
        Message::SettingsChanged { context, settings } => {
            lifecycle::handle_settings_changed(state, context, settings)
        }
        Message::Custom { context, payload } => {
            lifecycle::handle_custom(state, context, &payload)
        }
        Message::ScanCompleted { context, devices } => {
            lifecycle::handle_scan_completed(state, context, devices)
        }

        // ─────────────────────────────────────────────────────────
        // Input
        // ─────────────────────────────────────────────────────────
        Message::Press { context } => input::handle_press(state, context),
        Message::Rotate { context, ticks } => input::handle_rotate(state, context, ticks),
        Message::Tap { context } => input::handle_tap(state, context, now),
        Message::SelectionTimeout { context, token } => {
            input::handle_selection_timeout(state, context, token)
        }

        // ─────────────────────────────────────────────────────────
        // Polling
        // ─────────────────────────────────────────────────────────
        Message::PollCompleted {
            context,
            generation,
            outcome,
        } => polling::handle_poll_completed(state, context, generation, outcome),

        Message::Shutdown => {
            state.sessions.clear();
            state.request_quit();
            UpdateResult::none()
        }
    }
}
