//! Configuration for wled-dial
//!
//! - `config.toml` under the user config directory: polling, input and
//!   discovery tuning ([`AppConfig`])
//! - per-dial JSON settings owned by the host ([`ActionSettings`])

pub mod settings;
pub mod types;

use std::path::{Path, PathBuf};

use wled_core::prelude::*;

pub use settings::{ActionSettings, DEFAULT_OFFLINE_COLOR};
pub use types::{AppConfig, DiscoveryConfig, InputConfig, PollingConfig};

const CONFIG_DIR: &str = "wled-dial";
const CONFIG_FILENAME: &str = "config.toml";

/// `<config_dir>/wled-dial/config.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
}

/// Load config from `path`.
///
/// Returns defaults if the file doesn't exist or can't be parsed.
pub fn load_config(path: &Path) -> AppConfig {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return AppConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                debug!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                AppConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            AppConfig::default()
        }
    }
}

/// Save config to `path` with a comment header.
///
/// Uses atomic write (temp file + rename).
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::config(format!("Config path {:?} has no parent", path)))?;
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::config(format!("Failed to create {:?}: {}", dir, e)))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
    let full_content = format!("{}{}", CONFIG_HEADER, content);

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved config to {:?}", path);
    Ok(())
}

/// Write a default config file unless one exists. Returns whether it wrote.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(path, &AppConfig::default())?;
    Ok(true)
}

const CONFIG_HEADER: &str = r#"# wled-dial configuration
#
# [polling]    device refresh cadence and request deadlines (milliseconds)
# [input]      dial behaviour: menu timeout, tap debounce, brightness step
# [discovery]  network scan: per-host deadline, batch width, subnet priority

"#;
