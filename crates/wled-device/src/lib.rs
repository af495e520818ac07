//! # wled-device - WLED Device I/O
//!
//! Talks to WLED controllers over their JSON HTTP API and finds them on the
//! local network.
//!
//! Depends on [`wled_core`] for addresses and error handling.
//!
//! ## Public API
//!
//! ### Protocol
//! - [`DeviceState`], [`Segment`], [`RelayBlock`] - Cached device state from `GET /json`
//! - [`DeviceSnapshot`] - Lenient parse of the full `/json` payload
//! - [`Preset`], [`parse_presets()`] - Preset catalog from `GET /presets.json`
//! - [`StatePatch`] - Partial state written with `POST /json/state`
//!
//! ### Client
//! - [`probe()`] - Bounded-timeout GET returning parsed JSON
//! - [`DeviceClient`] - Async trait the application layer polls and commands through
//! - [`HttpDeviceClient`] - reqwest-backed implementation
//!
//! ### Discovery
//! - [`scan()`] - Sweep local /24 subnets for devices
//! - [`scan_candidates()`] - Batched probe of an explicit candidate list

pub mod client;
pub mod discovery;
pub mod protocol;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

// Public API re-exports
pub use client::{
    post_json, probe, DeviceClient, HttpDeviceClient, LocalDeviceClient, ProbeTimeouts,
    INFO_PATH, PRESETS_PATH, STATE_PATH, STATE_WRITE_PATH,
};
pub use discovery::{
    build_candidates, local_subnets, prioritize_subnets, scan, scan_candidates, ScanOptions,
    DEFAULT_BATCH_SIZE, DEFAULT_PRIORITY_PREFIXES, MIN_BATCH_SIZE, WELL_KNOWN_HOSTS,
};
pub use protocol::{
    parse_presets, DeviceSnapshot, DeviceState, DiscoveredDevice, Preset, RelayBlock, RelayEntry,
    RelayPatch, Segment, SegmentPatch, StatePatch,
};
