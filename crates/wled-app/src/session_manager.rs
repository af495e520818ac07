//! Registry of live sessions keyed by host context id

use std::collections::HashMap;

use wled_core::prelude::*;

use crate::config::ActionSettings;
use crate::session::{Epochs, Session, SessionHandle};

/// Owns every session. A session exists from its context's first
/// appearance until it disappears.
///
/// Poll generations and selection tokens come from counters shared across
/// all sessions and never reset, so a context that disappears and comes back
/// cannot accept messages meant for its previous session.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<String, SessionHandle>,
    epochs: Epochs,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `context`, creating it from `settings` on
    /// first appearance. The flag is `true` if the session was created.
    ///
    /// An existing session is returned unchanged; callers apply new settings
    /// themselves so they can react to an address change.
    pub fn get_or_create(
        &mut self,
        context: &str,
        settings: ActionSettings,
    ) -> (&mut SessionHandle, bool) {
        let created = !self.sessions.contains_key(context);
        if created {
            info!("[{}] session created", context);
        }
        let epochs = &self.epochs;
        let handle = self
            .sessions
            .entry(context.to_string())
            .or_insert_with(|| {
                SessionHandle::new(Session::new(context, settings), epochs.clone())
            });
        (handle, created)
    }

    /// Tear down and remove a session.
    ///
    /// The returned handle has no live tasks.
    pub fn remove(&mut self, context: &str) -> Option<SessionHandle> {
        let mut handle = self.sessions.remove(context)?;
        handle.teardown();
        info!("[{}] session removed", context);
        Some(handle)
    }

    pub fn get(&self, context: &str) -> Option<&SessionHandle> {
        self.sessions.get(context)
    }

    pub fn get_mut(&mut self, context: &str) -> Option<&mut SessionHandle> {
        self.sessions.get_mut(context)
    }

    pub fn contains(&self, context: &str) -> bool {
        self.sessions.contains_key(context)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Tear down every session
    pub fn clear(&mut self) {
        for (_, mut handle) in self.sessions.drain() {
            handle.teardown();
        }
    }
}
