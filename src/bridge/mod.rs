//! Stdio host bridge - NDJSON host protocol
//!
//! The dial host talks to this process over stdin/stdout. Each stdin line is
//! one [`HostEvent`](wled_app::HostEvent); each stdout line is one
//! [`OutboundEvent`]. Logs never go to stdout.
//!
//! # Example Exchange
//!
//! ```json
//! {"event":"willAppear","context":"dial-1","settings":{"ipAddress":"192.168.1.50"}}
//! {"event":"setFeedback","context":"dial-1","image":"data:image/svg+xml;base64,...","timestamp":1704700001000}
//! {"event":"dialRotate","context":"dial-1","ticks":2}
//! ```

pub mod runner;

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use wled_app::{ActionSettings, HostBridge};
use wled_core::prelude::*;

/// Events written to the host
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// Persist a context's settings object
    SetSettings {
        context: String,
        settings: Value,
        timestamp: i64,
    },

    /// Replace a context's dial face
    SetFeedback {
        context: String,
        image: String,
        timestamp: i64,
    },

    /// The bridge itself hit an error
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl OutboundEvent {
    /// Write this event as one NDJSON line and flush
    pub fn write_to<W: Write>(&self, out: &mut W) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize host event: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(out, "{}", json) {
            error!("Failed to write host event: {}", e);
            return;
        }

        // Flush to ensure immediate delivery
        if let Err(e) = out.flush() {
            error!("Failed to flush host output: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn set_settings(context: &str, settings: &ActionSettings) -> Self {
        Self::SetSettings {
            context: context.to_string(),
            settings: settings.to_value(),
            timestamp: Self::now(),
        }
    }

    pub fn set_feedback(context: &str, image: &str) -> Self {
        Self::SetFeedback {
            context: context.to_string(),
            image: image.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn error(message: impl Into<String>, fatal: bool) -> Self {
        Self::Error {
            message: message.into(),
            fatal,
            timestamp: Self::now(),
        }
    }
}

/// [`HostBridge`] that writes [`OutboundEvent`] lines to a writer
pub struct StdioHost<W> {
    out: Mutex<W>,
}

impl StdioHost<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StdioHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Write one event line
    pub fn emit(&self, event: &OutboundEvent) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        event.write_to(&mut *out);
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> HostBridge for StdioHost<W> {
    fn set_settings(&self, context: &str, settings: &ActionSettings) {
        self.emit(&OutboundEvent::set_settings(context, settings));
    }

    fn set_feedback(&self, context: &str, image: &str) {
        self.emit(&OutboundEvent::set_feedback(context, image));
    }
}
