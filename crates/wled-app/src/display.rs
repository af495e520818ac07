//! Dial face composition and SVG rendering
//!
//! [`compose`] reduces a session to the handful of strings and flags shown on
//! the dial. [`render_svg`] lays those out on a 200x100 canvas and
//! [`to_data_uri`] wraps the result for the host.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use wled_core::ControlMode;

use crate::config::ActionSettings;
use crate::session::{Session, SETUP_REQUIRED};

/// Background while the mode menu is open
pub const SELECTING_BACKGROUND: &str = "#3984E9";

/// Default background
pub const BACKGROUND: &str = "#000000";

/// Value shown when the device does not answer
pub const NO_CONNECTION: &str = "NO CONN";

const ACCENT: &str = "#3984E9";
const WHITE: &str = "#FFFFFF";
const NAME_AND_LABEL_BUDGET: usize = 22;
const VALUE_BUDGET: usize = 18;
const BAR_WIDTH: f64 = 192.0;

/// Everything the dial face shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub name: String,
    pub label: String,
    pub value: String,
    pub error: bool,
    pub selecting: bool,
    /// Brightness as 0..=100
    pub percent: u8,
    /// Whether the light is soft-on; drives the bar colours
    pub active: bool,
}

impl DisplayFrame {
    fn status(name: &str, label: &str, value: &str, error: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            value: value.to_string(),
            error,
            selecting: false,
            percent: 0,
            active: false,
        }
    }
}

/// Per-context rendering options taken from settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Background used while in error, if enabled
    pub offline_background: Option<String>,
}

impl RenderOptions {
    pub fn from_settings(settings: &ActionSettings) -> Self {
        Self {
            offline_background: settings.offline_background().map(str::to_string),
        }
    }
}

/// Brightness 0..=255 as a rounded percentage
pub fn brightness_percent(brightness: u8) -> u8 {
    (f64::from(brightness) / 255.0 * 100.0).round() as u8
}

/// Build the frame for a session's current state
pub fn compose(session: &Session) -> DisplayFrame {
    if !session.is_configured() {
        let reason = session.last_error.as_deref().unwrap_or(SETUP_REQUIRED);
        return DisplayFrame::status("WLED", "SETUP", reason, true);
    }
    if session.connection_error {
        return DisplayFrame::status(&session.device_name, "STATUS", NO_CONNECTION, true);
    }
    let Some(state) = session.state.as_ref() else {
        return DisplayFrame::status(&session.device_name, "STATUS", "Loading...", false);
    };

    let active = state.is_soft_on();
    let percent = brightness_percent(state.brightness);

    if session.selecting {
        return DisplayFrame {
            name: session.device_name.clone(),
            label: "SELECT".to_string(),
            value: session.pending_mode.label().to_string(),
            error: false,
            selecting: true,
            percent,
            active,
        };
    }

    let value = match session.mode {
        ControlMode::Brightness if active => format!("{}%", percent),
        ControlMode::Brightness => "OFF".to_string(),
        ControlMode::Effect => {
            let id = state.primary_segment().map(|s| s.effect_id).unwrap_or(0);
            catalog_name(&session.effects, id)
        }
        ControlMode::Palette => {
            let id = state.primary_segment().map(|s| s.palette_id).unwrap_or(0);
            catalog_name(&session.palettes, id)
        }
        ControlMode::Preset => {
            let mut id = i64::from(state.preset_id);
            if id <= 0 && session.last_good_preset > 0 {
                id = i64::from(session.last_good_preset);
            }
            match session.presets.iter().find(|p| i64::from(p.id) == id) {
                Some(preset) => preset.name.clone(),
                None if id > 0 => format!("ID {}", id),
                None => "None".to_string(),
            }
        }
        ControlMode::Relay if !session.has_relay_module => "NO RELAY".to_string(),
        ControlMode::Relay if session.relay_state => "ON".to_string(),
        ControlMode::Relay => "OFF".to_string(),
    };

    DisplayFrame {
        name: session.device_name.clone(),
        label: session.mode.label().to_string(),
        value,
        error: false,
        selecting: false,
        percent,
        active,
    }
}

fn catalog_name(catalog: &[String], id: u32) -> String {
    catalog
        .get(id as usize)
        .filter(|name| !name.is_empty())
        .cloned()
        .unwrap_or_else(|| format!("ID {}", id))
}

/// Shorten to `budget` characters, ending in `..` when cut
fn truncate(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let kept: String = text.chars().take(budget.saturating_sub(2)).collect();
    format!("{}..", kept)
}

fn value_font_size(value: &str, selecting: bool) -> u32 {
    if selecting {
        return 20;
    }
    match value.chars().count() {
        len if len > 15 => 14,
        len if len > 13 => 16,
        len if len > 10 => 18,
        len if len > 7 => 20,
        _ => 24,
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a frame as a 200x100 SVG document
pub fn render_svg(frame: &DisplayFrame, options: &RenderOptions) -> String {
    let background = if frame.error {
        options.offline_background.as_deref().unwrap_or(BACKGROUND)
    } else if frame.selecting {
        SELECTING_BACKGROUND
    } else {
        BACKGROUND
    };
    let label_color = if frame.selecting || frame.error {
        WHITE
    } else {
        ACCENT
    };
    let (stroke, bar_fill) = if frame.active {
        ("#ffffff", ACCENT)
    } else {
        ("#666666", "#444444")
    };

    let name_budget = NAME_AND_LABEL_BUDGET.saturating_sub(frame.label.chars().count() + 3);
    let name = truncate(&frame.name, name_budget);
    let value = truncate(&frame.value, VALUE_BUDGET);
    let font_size = value_font_size(&value, frame.selecting);
    let offline = value == NO_CONNECTION;

    let subtitle = if offline {
        r##"<text x="127" y="85" text-anchor="middle" font-family="sans-serif" font-size="14" font-weight="bold" fill="#DDDDDD">(OFFLINE?)</text>"##
            .to_string()
    } else {
        String::new()
    };

    let bar = if frame.selecting || offline {
        String::new()
    } else {
        let filled = BAR_WIDTH * f64::from(frame.percent.min(100)) / 100.0;
        format!(
            concat!(
                r#"<rect x="4" y="76" width="{max}" height="10" rx="5" ry="5" fill="none" stroke="{stroke}" stroke-width="1"/>"#,
                r##"<rect x="5" y="77" width="{inner}" height="8" fill="#333333" rx="4" ry="4"/>"##,
                r#"<rect x="5" y="77" width="{filled}" height="8" fill="{fill}" rx="4" ry="4"/>"#,
            ),
            max = BAR_WIDTH,
            inner = BAR_WIDTH - 2.0,
            stroke = stroke,
            filled = filled,
            fill = bar_fill,
        )
    };

    format!(
        concat!(
            r#"<svg width="200" height="100" viewBox="0 0 200 100" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<rect width="200" height="100" fill="{background}"/>"#,
            r#"<text x="5" y="22" text-anchor="start" font-family="sans-serif" font-size="14" font-weight="600" fill="{white}">"#,
            r#"{name} (<tspan fill="{label_color}">{label}</tspan>)</text>"#,
            r#"<text x="127" y="60" text-anchor="middle" font-family="sans-serif" font-size="{font_size}" font-weight="bold" fill="{white}">{value}</text>"#,
            "{subtitle}{bar}</svg>"
        ),
        background = escape_xml(background),
        white = WHITE,
        name = escape_xml(&name),
        label_color = label_color,
        label = escape_xml(&frame.label),
        font_size = font_size,
        value = escape_xml(&value),
        subtitle = subtitle,
        bar = bar,
    )
}

/// Wrap an SVG document as a base64 data URI
pub fn to_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}
