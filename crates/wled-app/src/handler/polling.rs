//! Poll result handlers

use wled_core::prelude::*;

use crate::message::PollOutcome;
use crate::state::AppState;

use super::{UpdateAction, UpdateResult};

/// Apply a finished poll cycle.
///
/// Results from a superseded loop (old generation) are dropped.
pub fn handle_poll_completed(
    state: &mut AppState,
    context: String,
    generation: u64,
    outcome: PollOutcome,
) -> UpdateResult {
    let Some(handle) = state.sessions.get_mut(&context) else {
        return UpdateResult::none();
    };
    let session = &mut handle.session;
    if !session.polling || session.poll_generation != generation {
        trace!(
            "[{}] stale poll result dropped (generation {} != {})",
            context,
            generation,
            session.poll_generation
        );
        return UpdateResult::none();
    }

    let mut result = UpdateResult::none();
    match outcome {
        PollOutcome::Updated { snapshot, presets } => {
            if session.connection_error {
                info!("[{}] device back online", context);
            }
            if session.apply_snapshot(snapshot, presets) {
                result = result.with(UpdateAction::PersistSettings {
                    context: context.clone(),
                    settings: session.settings.clone(),
                });
            }
        }
        PollOutcome::Failed { timed_out, reason } => {
            if !session.connection_error {
                warn!(
                    "[{}] device unreachable ({}): {}",
                    context,
                    if timed_out { "timeout" } else { "error" },
                    reason
                );
            }
            session.mark_offline();
        }
    }
    result.with(UpdateAction::Render { context })
}
