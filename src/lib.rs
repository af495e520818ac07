//! wled-dial
//!
//! Rotary-dial controller sessions for WLED lighting devices, driven by a
//! dial host over an NDJSON stdio protocol.

pub mod bridge;
pub mod commands;

// Re-export main entry points
pub use bridge::runner::run_stdio;
