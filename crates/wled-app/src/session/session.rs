//! Session - cached state and input semantics for one dial

use std::time::Duration;

use tokio::time::Instant;
use wled_core::prelude::*;
use wled_core::{ControlMode, DeviceAddress};
use wled_device::{DeviceSnapshot, DeviceState, Preset, StatePatch};

use crate::config::ActionSettings;

/// Name shown until the device reports its own
pub const DEFAULT_DEVICE_NAME: &str = "WLED";

/// Error label while no valid address is configured
pub const SETUP_REQUIRED: &str = "Setup Req.";

/// Error label after a failed poll
pub const OFFLINE: &str = "Offline";

/// State of one dial bound to (at most) one WLED device.
///
/// Every method here is synchronous and side-effect free apart from the
/// session itself; network writes are returned as [`StatePatch`]es for the
/// caller to send.
#[derive(Debug, Clone)]
pub struct Session {
    /// Host context id
    pub context: String,

    /// Working copy of the host-persisted settings
    pub settings: ActionSettings,

    /// `None` while unconfigured
    pub address: Option<DeviceAddress>,

    pub device_name: String,

    /// Last polled device state, optimistically patched by commands
    pub state: Option<DeviceState>,

    pub effects: Vec<String>,
    pub palettes: Vec<String>,

    /// Sorted by id, slot 0 excluded
    pub presets: Vec<Preset>,

    /// Active control dimension
    pub mode: ControlMode,

    /// Highlighted entry while the menu is open, `mode` otherwise
    pub pending_mode: ControlMode,

    pub selecting: bool,

    pub connection_error: bool,
    pub last_error: Option<String>,

    /// Last non-zero brightness, 0 if never seen
    pub last_good_brightness: u8,

    /// Last preset id above zero, 0 if never seen
    pub last_good_preset: u32,

    pub last_toggle: Option<Instant>,

    pub has_relay_module: bool,
    pub relay_count: u32,

    /// State of the configured target relay
    pub relay_state: bool,

    /// Whether a poll loop has been requested for the current address
    pub polling: bool,

    /// Replaced whenever polling starts or stops; stale poll results carry an old value
    pub poll_generation: u64,

    /// Replaced whenever the selection timer is armed or cancelled
    pub selection_token: u64,
}

impl Session {
    pub fn new(context: impl Into<String>, settings: ActionSettings) -> Self {
        let mode = settings.mode_or_default();
        let mut session = Self {
            context: context.into(),
            settings: ActionSettings::default(),
            address: None,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            state: None,
            effects: Vec::new(),
            palettes: Vec::new(),
            presets: Vec::new(),
            mode,
            pending_mode: mode,
            selecting: false,
            connection_error: false,
            last_error: None,
            last_good_brightness: 0,
            last_good_preset: 0,
            last_toggle: None,
            has_relay_module: false,
            relay_count: 0,
            relay_state: false,
            polling: false,
            poll_generation: 0,
            selection_token: 0,
        };
        session.apply_settings(settings);
        session
    }

    /// Replace the settings mirror and re-derive the address.
    ///
    /// Returns `true` when the address changed.
    pub fn apply_settings(&mut self, settings: ActionSettings) -> bool {
        let address = DeviceAddress::from_setting(settings.ip_address.as_deref());
        if let Some(mode) = settings.mode {
            self.mode = mode;
            if !self.selecting {
                self.pending_mode = mode;
            }
        }
        self.settings = settings;

        let changed = address != self.address;
        if changed {
            // Cached data belongs to the previous device
            self.state = None;
            self.effects.clear();
            self.palettes.clear();
            self.presets.clear();
            self.device_name = DEFAULT_DEVICE_NAME.to_string();
            self.has_relay_module = false;
            self.relay_state = false;
            self.connection_error = false;
            self.last_error = None;
        }
        self.address = address;
        if self.address.is_none() {
            self.connection_error = true;
            self.last_error = Some(SETUP_REQUIRED.to_string());
        }
        changed
    }

    pub fn is_configured(&self) -> bool {
        self.address.is_some()
    }

    /// Modes reachable from the menu right now
    pub fn allowed_modes(&self) -> Vec<ControlMode> {
        ControlMode::menu_order(self.has_relay_module)
    }

    // ─────────────────────────────────────────────────────────
    // Polling
    // ─────────────────────────────────────────────────────────

    /// Merge a successful poll.
    ///
    /// Each part of the snapshot is applied only if present. Returns `true`
    /// when the derived relay facts differ from the settings mirror, in which
    /// case the mirror has been updated and must be persisted.
    pub fn apply_snapshot(&mut self, snapshot: DeviceSnapshot, presets: Option<Vec<Preset>>) -> bool {
        let mut settings_changed = false;

        if let Some(state) = snapshot.state {
            if state.preset_id > 0 {
                self.last_good_preset = state.preset_id as u32;
            }
            if state.brightness > 0 {
                self.last_good_brightness = state.brightness;
            }

            let (has_relay, count, target_state) = match state.relay_module() {
                Some(block) => (
                    true,
                    block.count() as u32,
                    block.state_of(self.settings.relay_target()),
                ),
                None => (false, 0, false),
            };
            if has_relay != self.has_relay_module {
                info!(
                    "[{}] relay module {}",
                    self.context,
                    if has_relay { "detected" } else { "gone" }
                );
            }
            self.has_relay_module = has_relay;
            self.relay_count = count;
            self.relay_state = target_state;
            self.state = Some(state);

            if self.settings.relay_count != Some(count)
                || self.settings.has_multi_relay != Some(has_relay)
            {
                self.settings.relay_count = Some(count);
                self.settings.has_multi_relay = Some(has_relay);
                settings_changed = true;
            }

            if self.selecting && !self.allowed_modes().contains(&self.pending_mode) {
                self.pending_mode = ControlMode::Brightness;
            }
        }

        if let Some(name) = snapshot.name.filter(|n| !n.is_empty()) {
            self.device_name = name;
        }
        if let Some(effects) = snapshot.effects {
            self.effects = effects;
        }
        if let Some(palettes) = snapshot.palettes {
            self.palettes = palettes;
        }
        if let Some(presets) = presets {
            self.presets = presets;
        }

        self.connection_error = false;
        self.last_error = None;
        settings_changed
    }

    /// Record a failed poll. Cached state stays on display.
    pub fn mark_offline(&mut self) {
        self.connection_error = true;
        self.last_error = Some(OFFLINE.to_string());
    }

    // ─────────────────────────────────────────────────────────
    // Mode menu
    // ─────────────────────────────────────────────────────────

    pub fn open_menu(&mut self) {
        self.selecting = true;
        self.pending_mode = if self.allowed_modes().contains(&self.mode) {
            self.mode
        } else {
            ControlMode::Brightness
        };
    }

    /// Close the menu, making the highlighted mode active
    pub fn commit_menu(&mut self) -> ControlMode {
        self.selecting = false;
        self.mode = self.pending_mode;
        self.settings.mode = Some(self.mode);
        self.mode
    }

    /// Close the menu without committing
    pub fn cancel_menu(&mut self) {
        self.selecting = false;
        self.pending_mode = self.mode;
    }

    /// Move the highlight one entry per call, wrapping at both ends
    pub fn cycle_pending(&mut self, ticks: i32) {
        let modes = self.allowed_modes();
        let index = modes
            .iter()
            .position(|m| *m == self.pending_mode)
            .unwrap_or(0);
        let next = if ticks > 0 {
            (index + 1) % modes.len()
        } else {
            (index + modes.len() - 1) % modes.len()
        };
        self.pending_mode = modes[next];
    }

    // ─────────────────────────────────────────────────────────
    // Rotation in the active mode
    // ─────────────────────────────────────────────────────────

    /// Always yields a patch, synthesizing a state if none is cached
    pub fn adjust_brightness(&mut self, ticks: i32, step: u8) -> StatePatch {
        let current = self.state.as_ref().map(|s| s.brightness).unwrap_or(0);
        let target = (i64::from(current) + i64::from(ticks) * i64::from(step)).clamp(0, 255) as u8;

        match self.state.as_mut() {
            Some(state) => {
                state.brightness = target;
                state.on = true;
            }
            None => self.state = Some(DeviceState::synthesized_on(target)),
        }
        if target > 0 {
            self.last_good_brightness = target;
        }
        StatePatch::power_on(target)
    }

    pub fn step_effect(&mut self, ticks: i32) -> Option<StatePatch> {
        let len = self.effects.len();
        let state = self.state.as_mut().filter(|_| len > 0)?;
        let segment = state.primary_segment_mut();
        segment.effect_id = wrap_index(segment.effect_id as usize, ticks, len) as u32;
        Some(StatePatch::effect(segment.effect_id))
    }

    pub fn step_palette(&mut self, ticks: i32) -> Option<StatePatch> {
        let len = self.palettes.len();
        let state = self.state.as_mut().filter(|_| len > 0)?;
        let segment = state.primary_segment_mut();
        segment.palette_id = wrap_index(segment.palette_id as usize, ticks, len) as u32;
        Some(StatePatch::palette(segment.palette_id))
    }

    pub fn step_preset(&mut self, ticks: i32) -> Option<StatePatch> {
        if self.presets.is_empty() {
            return None;
        }
        let current = self.state.as_ref().map(|s| s.preset_id).unwrap_or(0);
        let index = self
            .presets
            .iter()
            .position(|p| i64::from(p.id) == i64::from(current))
            .unwrap_or(0);
        let preset_id = self.presets[wrap_index(index, ticks, self.presets.len())].id;

        if let Some(state) = self.state.as_mut() {
            state.preset_id = preset_id as i32;
        }
        self.last_good_preset = preset_id;
        Some(StatePatch::preset(preset_id))
    }

    /// Positive ticks switch the target relay on, negative off.
    ///
    /// Yields a patch only when the requested state differs from the cached one.
    pub fn set_relay(&mut self, ticks: i32) -> Option<StatePatch> {
        if !self.has_relay_module || ticks == 0 {
            return None;
        }
        let requested = ticks > 0;
        if requested == self.relay_state {
            return None;
        }
        self.relay_state = requested;
        Some(StatePatch::relay(self.settings.relay_target(), requested))
    }

    /// Dispatch a rotation to the active mode's handler
    pub fn rotate(&mut self, ticks: i32, brightness_step: u8) -> Option<StatePatch> {
        match self.mode {
            ControlMode::Brightness => Some(self.adjust_brightness(ticks, brightness_step)),
            ControlMode::Effect => self.step_effect(ticks),
            ControlMode::Palette => self.step_palette(ticks),
            ControlMode::Preset => self.step_preset(ticks),
            ControlMode::Relay => self.set_relay(ticks),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Tap
    // ─────────────────────────────────────────────────────────

    /// Soft power toggle.
    ///
    /// Returns `None` without touching any state when the tap is debounced
    /// or there is nothing to toggle yet.
    pub fn toggle_power(
        &mut self,
        now: Instant,
        debounce: Duration,
        default_brightness: u8,
    ) -> Option<StatePatch> {
        if self.address.is_none() {
            return None;
        }
        if let Some(last) = self.last_toggle {
            if now.saturating_duration_since(last) < debounce {
                return None;
            }
        }
        let state = self.state.as_mut()?;
        self.last_toggle = Some(now);

        if state.is_soft_on() {
            self.last_good_brightness = state.brightness;
            state.brightness = 0;
            Some(StatePatch::brightness(0))
        } else {
            let restored = if self.last_good_brightness > 0 {
                self.last_good_brightness
            } else {
                default_brightness
            };
            state.brightness = restored;
            state.on = true;
            Some(StatePatch::power_on(restored))
        }
    }
}

/// `(index + ticks) mod len`, wrapping in both directions
fn wrap_index(index: usize, ticks: i32, len: usize) -> usize {
    let len = len as i64;
    (index as i64 + i64::from(ticks)).rem_euclid(len) as usize
}
