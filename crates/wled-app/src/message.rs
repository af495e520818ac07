//! Message types for the application (TEA pattern)

use serde_json::Value;
use wled_device::{DeviceSnapshot, DiscoveredDevice, Preset};

use crate::config::ActionSettings;

/// Result of one poll cycle
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// `/json` answered; presets are `None` if their fetch failed
    Updated {
        snapshot: DeviceSnapshot,
        presets: Option<Vec<Preset>>,
    },

    /// `/json` failed
    Failed { timed_out: bool, reason: String },
}

/// All possible messages in the application
#[derive(Debug, Clone)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Host lifecycle
    // ─────────────────────────────────────────────────────────
    /// A dial became visible
    Appear {
        context: String,
        settings: ActionSettings,
    },

    /// A dial went away; its session is torn down
    Disappear { context: String },

    /// The host persisted new settings for a dial
    SettingsChanged {
        context: String,
        settings: ActionSettings,
    },

    /// Inspector payload, e.g. `{"event": "startScan"}`
    Custom { context: String, payload: Value },

    // ─────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────
    /// Dial pressed: open or commit the mode menu
    Press { context: String },

    /// Dial turned; positive is clockwise
    Rotate { context: String, ticks: i32 },

    /// Touch strip tapped: soft power toggle
    Tap { context: String },

    // ─────────────────────────────────────────────────────────
    // Background tasks
    // ─────────────────────────────────────────────────────────
    PollCompleted {
        context: String,
        generation: u64,
        outcome: PollOutcome,
    },

    SelectionTimeout { context: String, token: u64 },

    ScanCompleted {
        context: String,
        devices: Vec<DiscoveredDevice>,
    },

    /// Stop the engine
    Shutdown,
}
