//! Per-dial session state

mod handle;
#[allow(clippy::module_inception)]
mod session;

#[cfg(test)]
mod tests;

pub use handle::{Epochs, SessionHandle};
pub use session::{Session, DEFAULT_DEVICE_NAME, OFFLINE, SETUP_REQUIRED};
