//! WLED JSON API wire types
//!
//! Field names follow the device's abbreviated JSON keys (`bri`, `ps`, `seg`,
//! `fx`, ...). Every field is defaulted so older firmware that omits a key
//! still parses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wled_core::prelude::*;

/// Name shown for a discovered device whose `/json/info` has no `name`
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown WLED";

/// Device-side lighting zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "fx", default)]
    pub effect_id: u32,
    #[serde(rename = "pal", default)]
    pub palette_id: u32,
    #[serde(rename = "sx", default = "default_segment_level")]
    pub speed: u8,
    #[serde(rename = "ix", default = "default_segment_level")]
    pub intensity: u8,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            effect_id: 0,
            palette_id: 0,
            speed: default_segment_level(),
            intensity: default_segment_level(),
        }
    }
}

fn default_segment_level() -> u8 {
    128
}

/// One switchable output of the multi-relay usermod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEntry {
    pub relay: u32,
    #[serde(default)]
    pub state: bool,
}

/// `MultiRelay` block reported when the relay usermod is installed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayBlock {
    #[serde(default)]
    pub relays: Vec<RelayEntry>,
}

impl RelayBlock {
    pub fn count(&self) -> usize {
        self.relays.len()
    }

    /// State of relay `id`, false when the device doesn't list it
    pub fn state_of(&self, id: u32) -> bool {
        self.relays
            .iter()
            .find(|r| r.relay == id)
            .map(|r| r.state)
            .unwrap_or(false)
    }
}

/// The `state` object of `GET /json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    #[serde(default)]
    pub on: bool,
    #[serde(rename = "bri", default)]
    pub brightness: u8,
    /// Active preset, `-1` or `0` when none
    #[serde(rename = "ps", default)]
    pub preset_id: i32,
    /// Active playlist, `-1` or `0` when none
    #[serde(rename = "pl", default)]
    pub playlist_id: i32,
    #[serde(rename = "seg", default)]
    pub segments: Vec<Segment>,
    #[serde(rename = "MultiRelay", default, skip_serializing_if = "Option::is_none")]
    pub relay: Option<RelayBlock>,
}

impl DeviceState {
    /// State assumed when the user turns the dial before the first poll lands
    pub fn synthesized_on(brightness: u8) -> Self {
        Self {
            on: true,
            brightness,
            preset_id: 0,
            playlist_id: 0,
            segments: vec![Segment::default()],
            relay: None,
        }
    }

    /// On flag set and brightness above zero
    pub fn is_soft_on(&self) -> bool {
        self.on && self.brightness > 0
    }

    /// Segment 0, created on demand for optimistic updates
    pub fn primary_segment_mut(&mut self) -> &mut Segment {
        if self.segments.is_empty() {
            self.segments.push(Segment::default());
        }
        &mut self.segments[0]
    }

    pub fn primary_segment(&self) -> Option<&Segment> {
        self.segments.first()
    }

    /// Relay block with at least one relay
    pub fn relay_module(&self) -> Option<&RelayBlock> {
        self.relay.as_ref().filter(|block| !block.relays.is_empty())
    }
}

/// Everything one `GET /json` returned.
///
/// Each part is parsed independently: a malformed `effects` array does not
/// throw away a good `state`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    pub state: Option<DeviceState>,
    pub name: Option<String>,
    pub effects: Option<Vec<String>>,
    pub palettes: Option<Vec<String>>,
}

impl DeviceSnapshot {
    /// Parse a `/json` payload.
    ///
    /// Fails only when the payload isn't a JSON object at all.
    pub fn from_json(payload: &Value) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| Error::malformed("device payload is not a JSON object"))?;

        let state = object.get("state").and_then(|v| parse_part(v, "state"));
        let name = object
            .get("info")
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let effects = object.get("effects").and_then(|v| parse_part(v, "effects"));
        let palettes = object
            .get("palettes")
            .and_then(|v| parse_part(v, "palettes"));

        Ok(Self {
            state,
            name,
            effects,
            palettes,
        })
    }
}

fn parse_part<T: serde::de::DeserializeOwned>(value: &Value, part: &str) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Ignoring malformed `{}` in device payload: {}", part, e);
            None
        }
    }
}

/// A stored preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: u32,
    pub name: String,
}

/// Parse `GET /presets.json` into a catalog sorted by id.
///
/// Slot `"0"` is the device's scratch slot and empty objects are unused
/// slots; both are skipped.
pub fn parse_presets(payload: &Value) -> Vec<Preset> {
    let Some(object) = payload.as_object() else {
        return Vec::new();
    };

    let mut presets: Vec<Preset> = object
        .iter()
        .filter(|(key, _)| key.as_str() != "0")
        .filter_map(|(key, entry)| {
            let entry = entry.as_object().filter(|e| !e.is_empty())?;
            let id = key.parse::<u32>().ok()?;
            let name = entry
                .get("n")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Preset {}", id));
            Some(Preset { id, name })
        })
        .collect();

    presets.sort_by_key(|p| p.id);
    presets
}

/// Segment-level part of a [`StatePatch`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentPatch {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pal: Option<u32>,
}

/// Relay switch request for the multi-relay usermod
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayPatch {
    pub relay: u32,
    pub on: bool,
}

/// Partial state body for `POST /json/state`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seg: Option<Vec<SegmentPatch>>,
    #[serde(rename = "MultiRelay", skip_serializing_if = "Option::is_none")]
    pub multi_relay: Option<RelayPatch>,
}

impl StatePatch {
    /// `{on: true, bri}`
    pub fn power_on(brightness: u8) -> Self {
        Self {
            on: Some(true),
            bri: Some(brightness),
            ..Default::default()
        }
    }

    /// `{bri}` only; dimming to zero leaves the power flag alone
    pub fn brightness(brightness: u8) -> Self {
        Self {
            bri: Some(brightness),
            ..Default::default()
        }
    }

    pub fn effect(effect_id: u32) -> Self {
        Self {
            seg: Some(vec![SegmentPatch {
                id: 0,
                fx: Some(effect_id),
                pal: None,
            }]),
            ..Default::default()
        }
    }

    pub fn palette(palette_id: u32) -> Self {
        Self {
            seg: Some(vec![SegmentPatch {
                id: 0,
                fx: None,
                pal: Some(palette_id),
            }]),
            ..Default::default()
        }
    }

    pub fn preset(preset_id: u32) -> Self {
        Self {
            ps: Some(preset_id),
            ..Default::default()
        }
    }

    pub fn relay(relay: u32, on: bool) -> Self {
        Self {
            multi_relay: Some(RelayPatch { relay, on }),
            ..Default::default()
        }
    }
}

/// A device found by the discovery scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    #[serde(rename = "ip")]
    pub address: String,
    pub name: String,
}

impl DiscoveredDevice {
    /// Build from a `/json/info` payload
    pub fn from_info(address: impl Into<String>, info: &Value) -> Self {
        let name = info
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_DEVICE_NAME);
        Self {
            address: address.into(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_parses_full_payload() {
        let payload = json!({
            "state": {
                "on": true, "bri": 128, "ps": 3, "pl": -1,
                "seg": [{"fx": 9, "pal": 2, "sx": 100, "ix": 200}]
            },
            "info": {"name": "Desk Strip"},
            "effects": ["Solid", "Blink"],
            "palettes": ["Default", "Rainbow"]
        });

        let snapshot = DeviceSnapshot::from_json(&payload).unwrap();
        let state = snapshot.state.unwrap();
        assert!(state.on);
        assert_eq!(state.brightness, 128);
        assert_eq!(state.preset_id, 3);
        assert_eq!(state.segments[0].effect_id, 9);
        assert_eq!(state.segments[0].palette_id, 2);
        assert!(state.relay.is_none());
        assert_eq!(snapshot.name.as_deref(), Some("Desk Strip"));
        assert_eq!(snapshot.effects.unwrap().len(), 2);
    }

    #[test]
    fn test_snapshot_keeps_good_parts_when_one_is_malformed() {
        let payload = json!({
            "state": {"on": true, "bri": 10},
            "effects": "not-a-list",
            "palettes": ["Default"]
        });

        let snapshot = DeviceSnapshot::from_json(&payload).unwrap();
        assert_eq!(snapshot.state.unwrap().brightness, 10);
        assert!(snapshot.effects.is_none());
        assert_eq!(snapshot.palettes.unwrap(), vec!["Default".to_string()]);
        assert!(snapshot.name.is_none());
    }

    #[test]
    fn test_snapshot_rejects_non_object() {
        let err = DeviceSnapshot::from_json(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn test_relay_block_detection() {
        let with_relays: DeviceState = serde_json::from_value(json!({
            "on": true, "bri": 5,
            "MultiRelay": {"relays": [{"relay": 0, "state": false}, {"relay": 1, "state": true}]}
        }))
        .unwrap();
        let module = with_relays.relay_module().unwrap();
        assert_eq!(module.count(), 2);
        assert!(module.state_of(1));
        assert!(!module.state_of(0));
        assert!(!module.state_of(7));

        let empty: DeviceState =
            serde_json::from_value(json!({"MultiRelay": {"relays": []}})).unwrap();
        assert!(empty.relay_module().is_none());
    }

    #[test]
    fn test_parse_presets_skips_slot_zero_and_empty() {
        let payload = json!({
            "0": {},
            "5": {"n": "Evening"},
            "2": {"n": "Morning", "bri": 80},
            "3": {},
            "9": {"bri": 10},
            "x": {"n": "bogus"}
        });

        let presets = parse_presets(&payload);
        assert_eq!(
            presets,
            vec![
                Preset { id: 2, name: "Morning".into() },
                Preset { id: 5, name: "Evening".into() },
                Preset { id: 9, name: "Preset 9".into() },
            ]
        );
    }

    #[test]
    fn test_state_patch_serialization() {
        assert_eq!(
            serde_json::to_value(StatePatch::power_on(200)).unwrap(),
            json!({"on": true, "bri": 200})
        );
        assert_eq!(
            serde_json::to_value(StatePatch::brightness(0)).unwrap(),
            json!({"bri": 0})
        );
        assert_eq!(
            serde_json::to_value(StatePatch::effect(4)).unwrap(),
            json!({"seg": [{"id": 0, "fx": 4}]})
        );
        assert_eq!(
            serde_json::to_value(StatePatch::relay(1, true)).unwrap(),
            json!({"MultiRelay": {"relay": 1, "on": true}})
        );
    }

    #[test]
    fn test_discovered_device_name_fallback() {
        let dev = DiscoveredDevice::from_info("10.0.0.4", &json!({"ver": "0.14"}));
        assert_eq!(dev.name, UNKNOWN_DEVICE_NAME);
        assert_eq!(
            serde_json::to_value(&dev).unwrap(),
            json!({"ip": "10.0.0.4", "name": "Unknown WLED"})
        );
    }
}
