//! Application configuration types
//!
//! Loaded from `config.toml`. Every field has a default, so an empty or
//! partial file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wled_device::{ProbeTimeouts, ScanOptions, DEFAULT_BATCH_SIZE, MIN_BATCH_SIZE};

/// Root of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl AppConfig {
    /// Request deadlines for the device client
    pub fn probe_timeouts(&self) -> ProbeTimeouts {
        ProbeTimeouts {
            state: Duration::from_millis(self.polling.state_timeout_ms),
            presets: Duration::from_millis(self.polling.presets_timeout_ms),
            command: Duration::from_millis(self.polling.command_timeout_ms),
            identify: Duration::from_millis(self.discovery.probe_timeout_ms),
        }
    }
}

/// `[polling]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between the end of one poll and the start of the next
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_state_timeout_ms")]
    pub state_timeout_ms: u64,

    #[serde(default = "default_presets_timeout_ms")]
    pub presets_timeout_ms: u64,

    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            state_timeout_ms: default_state_timeout_ms(),
            presets_timeout_ms: default_presets_timeout_ms(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_state_timeout_ms() -> u64 {
    3000
}

fn default_presets_timeout_ms() -> u64 {
    2000
}

fn default_command_timeout_ms() -> u64 {
    2500
}

/// `[input]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Idle time before an open mode menu closes without committing
    #[serde(default = "default_selection_timeout_ms")]
    pub selection_timeout_ms: u64,

    /// Taps closer together than this are ignored
    #[serde(default = "default_toggle_debounce_ms")]
    pub toggle_debounce_ms: u64,

    /// Brightness change per dial tick
    #[serde(default = "default_brightness_step")]
    pub brightness_step: u8,

    /// Brightness restored by a tap when none was remembered
    #[serde(default = "default_restore_brightness")]
    pub default_restore_brightness: u8,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            selection_timeout_ms: default_selection_timeout_ms(),
            toggle_debounce_ms: default_toggle_debounce_ms(),
            brightness_step: default_brightness_step(),
            default_restore_brightness: default_restore_brightness(),
        }
    }
}

impl InputConfig {
    pub fn selection_timeout(&self) -> Duration {
        Duration::from_millis(self.selection_timeout_ms)
    }

    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }
}

fn default_selection_timeout_ms() -> u64 {
    3000
}

fn default_toggle_debounce_ms() -> u64 {
    500
}

fn default_brightness_step() -> u8 {
    10
}

fn default_restore_brightness() -> u8 {
    128
}

/// `[discovery]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Probes per batch, never below a full /24
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Subnet prefixes scanned first, e.g. `"192.168.1"`
    #[serde(default = "default_priority_prefixes")]
    pub priority_prefixes: Vec<String>,

    /// Hostnames probed before any subnet
    #[serde(default = "default_well_known_hosts")]
    pub well_known_hosts: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            batch_size: default_batch_size(),
            priority_prefixes: default_priority_prefixes(),
            well_known_hosts: default_well_known_hosts(),
        }
    }
}

impl DiscoveryConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            batch_size: self.batch_size.max(MIN_BATCH_SIZE),
            priority_prefixes: self.priority_prefixes.clone(),
            well_known_hosts: self.well_known_hosts.clone(),
        }
    }
}

fn default_probe_timeout_ms() -> u64 {
    1500
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_priority_prefixes() -> Vec<String> {
    ScanOptions::default().priority_prefixes
}

fn default_well_known_hosts() -> Vec<String> {
    ScanOptions::default().well_known_hosts
}
