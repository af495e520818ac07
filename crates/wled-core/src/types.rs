//! Core domain types

use serde::{Deserialize, Serialize};

/// The control dimension a dial rotation currently affects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMode {
    #[default]
    Brightness,
    Effect,
    Preset,
    Palette,
    Relay,
}

impl ControlMode {
    /// Menu order without the relay entry
    pub const BASE_ORDER: [ControlMode; 4] = [
        ControlMode::Brightness,
        ControlMode::Effect,
        ControlMode::Preset,
        ControlMode::Palette,
    ];

    /// Modes selectable from the menu, in menu order.
    ///
    /// `Relay` is only offered when the device reports a relay module.
    pub fn menu_order(has_relay: bool) -> Vec<ControlMode> {
        let mut modes = Self::BASE_ORDER.to_vec();
        if has_relay {
            modes.push(ControlMode::Relay);
        }
        modes
    }

    /// Short label that fits the glyph header
    pub fn label(&self) -> &'static str {
        match self {
            ControlMode::Brightness => "BRIGHTN",
            ControlMode::Effect => "EFFECT",
            ControlMode::Preset => "PRESET",
            ControlMode::Palette => "PALETTE",
            ControlMode::Relay => "RELAY",
        }
    }
}
