//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Address Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid device address: {input:?}")]
    InvalidAddress { input: String },

    // ─────────────────────────────────────────────────────────────
    // Device Probe Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Request to {url} timed out after {timeout_ms}ms")]
    ProbeTimeout { url: String, timeout_ms: u64 },

    #[error("Request to {url} failed: {message}")]
    ProbeTransport { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    ProbeStatus { url: String, status: u16 },

    #[error("Malformed device payload: {message}")]
    MalformedPayload { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Discovery Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Discovery error: {message}")]
    Discovery { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn invalid_address(input: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.into(),
        }
    }

    pub fn probe_timeout(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self::ProbeTimeout {
            url: url.into(),
            timeout_ms,
        }
    }

    pub fn probe_transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProbeTransport {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn probe_status(url: impl Into<String>, status: u16) -> Self {
        Self::ProbeStatus {
            url: url.into(),
            status,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Whether this error came from a probe that ran out of time.
    ///
    /// Timeouts and transport failures both surface as "offline"; the
    /// distinction only matters for logging.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::ProbeTimeout { .. })
    }
}
