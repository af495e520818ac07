//! wled-app - Session state and orchestration for WLED dial controls
//!
//! This crate implements the TEA (The Elm Architecture) pattern for dial
//! sessions: per-context state, the update function, background polling and
//! timers, dial face rendering, configuration loading, and the host bridge
//! trait the engine reports through.

pub mod actions;
pub mod config;
pub mod display;
pub mod engine;
pub mod handler;
pub mod host;
pub mod message;
pub mod process;
pub mod session;
pub mod session_manager;
pub mod state;

// Re-export primary types
pub use config::{ActionSettings, AppConfig};
pub use display::{DisplayFrame, RenderOptions};
pub use engine::Engine;
pub use handler::{UpdateAction, UpdateResult};
pub use host::{HostBridge, HostEvent};
pub use message::{Message, PollOutcome};
pub use session::{Session, SessionHandle};
pub use session_manager::SessionManager;
pub use state::AppState;
