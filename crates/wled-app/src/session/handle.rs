//! Session handle - a session plus the background tasks it owns

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::session::Session;

/// Monotonic counter shared by every session in a registry.
///
/// Poll generations and selection tokens are drawn from here rather than
/// from per-session fields, so a value issued to a torn-down session is
/// never reissued to its replacement under the same context.
#[derive(Debug, Clone, Default)]
pub struct Sequence(Arc<AtomicU64>);

impl Sequence {
    /// Issue the next value; the first call returns 1
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Counters used to tag messages from a session's background tasks
#[derive(Debug, Clone, Default)]
pub struct Epochs {
    pub generations: Sequence,
    pub tokens: Sequence,
}

/// A session and its timers
pub struct SessionHandle {
    /// The session state
    pub session: Session,

    /// Poll loop for the current address.
    ///
    /// Aborted when the address changes, becomes invalid, or the session is
    /// torn down.
    pub poll_task: Option<JoinHandle<()>>,

    /// Pending selection-menu timeout; present iff the menu is open
    pub selection_task: Option<JoinHandle<()>>,

    epochs: Epochs,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &self.session)
            .field("has_poll_task", &self.poll_task.is_some())
            .field("has_selection_task", &self.selection_task.is_some())
            .finish()
    }
}

impl SessionHandle {
    pub fn new(session: Session, epochs: Epochs) -> Self {
        Self {
            session,
            poll_task: None,
            selection_task: None,
            epochs,
        }
    }

    /// Abort the poll loop and invalidate any result it already queued
    pub fn stop_polling(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        self.session.polling = false;
        self.session.poll_generation = self.epochs.generations.advance();
    }

    /// Abort the selection timer and invalidate any timeout it already queued
    pub fn cancel_selection_timer(&mut self) {
        if let Some(task) = self.selection_task.take() {
            task.abort();
        }
        self.session.selection_token = self.epochs.tokens.advance();
    }

    /// Cancel every task this session owns
    pub fn teardown(&mut self) {
        self.stop_polling();
        self.cancel_selection_timer();
    }

    pub fn has_live_tasks(&self) -> bool {
        self.poll_task.as_ref().is_some_and(|t| !t.is_finished())
            || self.selection_task.as_ref().is_some_and(|t| !t.is_finished())
    }
}
