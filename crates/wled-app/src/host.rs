//! Host bridge: the seam between the engine and the dial host
//!
//! Inbound host events are decoded into [`HostEvent`] and mapped to
//! [`Message`]s. Outbound, the engine only ever asks the host to persist a
//! settings object or to show a new dial face.

use serde::Deserialize;
use serde_json::Value;

use crate::config::ActionSettings;
use crate::message::Message;

/// Outbound calls to the host.
///
/// Implementations must not block; the engine calls them from its message
/// loop.
#[cfg_attr(test, mockall::automock)]
pub trait HostBridge: Send + Sync {
    /// Persist the settings object for `context`
    fn set_settings(&self, context: &str, settings: &ActionSettings);

    /// Replace the dial face for `context` with an image data URI
    fn set_feedback(&self, context: &str, image: &str);
}

/// An inbound host event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    WillAppear {
        context: String,
        #[serde(default)]
        settings: Value,
    },
    WillDisappear {
        context: String,
    },
    DidReceiveSettings {
        context: String,
        #[serde(default)]
        settings: Value,
    },
    DialDown {
        context: String,
    },
    DialRotate {
        context: String,
        ticks: i32,
    },
    TouchTap {
        context: String,
    },
    SendToPlugin {
        context: String,
        #[serde(default)]
        payload: Value,
    },
    Shutdown,
}

impl HostEvent {
    /// Translate into an engine message.
    ///
    /// Settings objects are decoded leniently; a malformed object yields
    /// defaults rather than an error.
    pub fn into_message(self) -> Message {
        match self {
            HostEvent::WillAppear { context, settings } => Message::Appear {
                context,
                settings: ActionSettings::from_value(&settings),
            },
            HostEvent::WillDisappear { context } => Message::Disappear { context },
            HostEvent::DidReceiveSettings { context, settings } => Message::SettingsChanged {
                context,
                settings: ActionSettings::from_value(&settings),
            },
            HostEvent::DialDown { context } => Message::Press { context },
            HostEvent::DialRotate { context, ticks } => Message::Rotate { context, ticks },
            HostEvent::TouchTap { context } => Message::Tap { context },
            HostEvent::SendToPlugin { context, payload } => Message::Custom { context, payload },
            HostEvent::Shutdown => Message::Shutdown,
        }
    }
}
