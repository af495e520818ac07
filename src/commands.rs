//! One-shot CLI commands

use std::path::Path;

use wled_app::config::{init_config, AppConfig};
use wled_core::prelude::*;
use wled_core::{classify_address, clean_address, AddressKind};
use wled_device::{scan, DiscoveredDevice, HttpDeviceClient};

/// Sweep the local network once and print what answered
pub async fn run_scan(config: &AppConfig, json: bool) -> Result<()> {
    let client = HttpDeviceClient::new(config.probe_timeouts())?;
    let options = config.discovery.scan_options();
    info!("Scanning with batch size {}", options.effective_batch_size());

    let devices = scan(&client, &options).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else {
        print!("{}", format_devices(&devices));
    }
    Ok(())
}

/// Human-readable device table
pub fn format_devices(devices: &[DiscoveredDevice]) -> String {
    if devices.is_empty() {
        return "No devices found\n".to_string();
    }
    let width = devices.iter().map(|d| d.address.len()).max().unwrap_or(0);
    devices
        .iter()
        .map(|d| format!("{:<width$}  {}\n", d.address, d.name, width = width))
        .collect()
}

/// Describe how `input` would be treated as a device address.
///
/// Returns the description and whether the address is usable.
pub fn describe_address(input: &str) -> (String, bool) {
    let cleaned = clean_address(input);
    match classify_address(input) {
        AddressKind::Ipv4 => (format!("{}: IPv4 address (http://{})", cleaned, cleaned), true),
        AddressKind::Hostname => (format!("{}: hostname (http://{})", cleaned, cleaned), true),
        AddressKind::Invalid => (format!("{:?}: invalid address", input), false),
    }
}

/// Write a default config file unless one exists
pub fn write_default_config(path: &Path) -> Result<()> {
    if init_config(path)? {
        println!("Wrote default config to {}", path.display());
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(())
}
