//! # wled-core - Core Domain Types
//!
//! Foundation crate for the WLED dial controller. Provides domain types, the
//! device address validator, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`ControlMode`] - Control dimension a rotation affects (brightness, effect, ...)
//!
//! ### Addresses (`address`)
//! - [`classify_address()`] - Classify free text as IPv4, hostname or invalid
//! - [`clean_address()`] - Strip scheme, trailing slashes and non-printable characters
//! - [`DeviceAddress`] - A validated device address
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum grouped by layer; probe timeouts are told apart with `is_timeout`
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use wled_core::prelude::*;
//! ```

pub mod address;
pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all wled-dial crates
pub mod prelude {
    pub use super::error::{Error, Result};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use address::{classify_address, clean_address, AddressKind, DeviceAddress};
pub use error::{Error, Result};
pub use types::ControlMode;
