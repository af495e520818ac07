//! Handler module - TEA update function and event handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `lifecycle`: Appear, disappear, settings and inspector handlers
//! - `input`: Dial press, rotation, tap and selection timeout handlers
//! - `polling`: Poll result handlers

pub(crate) mod input;
pub(crate) mod lifecycle;
pub(crate) mod polling;
pub(crate) mod update;


use wled_core::DeviceAddress;
use wled_device::StatePatch;

use crate::config::ActionSettings;
use crate::message::Message;

// Re-export main entry point
pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Spawn the poll loop for a session.
    ///
    /// Results are tagged with `generation`; the handler drops any result
    /// whose generation no longer matches the session.
    StartPolling {
        context: String,
        address: DeviceAddress,
        generation: u64,
    },

    /// Spawn the selection-menu timeout for a session
    ArmSelectionTimeout { context: String, token: u64 },

    /// Fire-and-forget state write to the device
    SendCommand {
        context: String,
        address: DeviceAddress,
        patch: StatePatch,
    },

    /// Hand the settings mirror to the host for persistence
    PersistSettings {
        context: String,
        settings: ActionSettings,
    },

    /// Compose, render and push the dial face
    Render { context: String },

    /// Sweep the local network for devices on behalf of the inspector
    StartScan { context: String },
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Actions for the event loop to perform, in order
    pub actions: Vec<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            actions: vec![action],
        }
    }

    /// Append another action
    pub fn with(mut self, action: UpdateAction) -> Self {
        self.actions.push(action);
        self
    }
}
