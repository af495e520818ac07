//! Per-context action settings
//!
//! The host persists one JSON object per dial. The inspector UI writes some
//! keys this crate never reads, so anything unrecognised is kept in `extra`
//! and written back untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use wled_core::ControlMode;
use wled_device::DiscoveredDevice;

/// Offline background used when `showOfflineColor` is set without a colour
pub const DEFAULT_OFFLINE_COLOR: &str = "#FF9800";

/// Settings object persisted by the host for one context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSettings {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_address: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub mode: Option<ControlMode>,

    /// Target relay, stored as a string by the inspector
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub relay_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub relay_count: Option<u32>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub has_multi_relay: Option<bool>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub found_devices: Option<Vec<DiscoveredDevice>>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub show_offline_color: Option<bool>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub offline_color: Option<String>,

    /// Keys owned by the inspector UI
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActionSettings {
    /// Parse a host settings object. Anything unparseable yields defaults.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed action settings: {}", e);
            Self::default()
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Object(Map::new()))
    }

    /// Relay id to switch, `0` when unset or not numeric
    pub fn relay_target(&self) -> u32 {
        self.relay_id
            .as_deref()
            .and_then(|id| id.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn mode_or_default(&self) -> ControlMode {
        self.mode.unwrap_or_default()
    }

    /// Offline tint, if the user enabled it
    pub fn offline_background(&self) -> Option<&str> {
        if self.show_offline_color.unwrap_or(false) {
            Some(
                self.offline_color
                    .as_deref()
                    .filter(|c| !c.is_empty())
                    .unwrap_or(DEFAULT_OFFLINE_COLOR),
            )
        } else {
            None
        }
    }
}

/// Deserialize to `None` instead of failing when the value has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
