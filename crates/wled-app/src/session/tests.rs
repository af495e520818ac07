//! Tests for the session module.

use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use wled_core::ControlMode;
use wled_device::test_utils::{preset, sample_payload, sample_payload_with_relays};
use wled_device::{DeviceSnapshot, StatePatch};

use crate::config::ActionSettings;
use crate::session::{Epochs, Session, SessionHandle, DEFAULT_DEVICE_NAME, SETUP_REQUIRED};

const DEBOUNCE: Duration = Duration::from_millis(500);

fn settings(address: &str) -> ActionSettings {
    ActionSettings {
        ip_address: Some(address.to_string()),
        ..Default::default()
    }
}

fn polled_session(payload: serde_json::Value) -> Session {
    let mut session = Session::new("ctx", settings("192.168.1.50"));
    session.apply_snapshot(DeviceSnapshot::from_json(&payload).unwrap(), None);
    session
}

#[test]
fn test_new_session_with_invalid_address_is_unconfigured() {
    let session = Session::new("ctx", settings("not an address"));
    assert!(!session.is_configured());
    assert!(session.connection_error);
    assert_eq!(session.last_error.as_deref(), Some(SETUP_REQUIRED));
    assert_eq!(session.device_name, DEFAULT_DEVICE_NAME);
}

#[test]
fn test_new_session_takes_mode_from_settings() {
    let session = Session::new(
        "ctx",
        ActionSettings {
            ip_address: Some("wled".into()),
            mode: Some(ControlMode::Palette),
            ..Default::default()
        },
    );
    assert!(session.is_configured());
    assert_eq!(session.mode, ControlMode::Palette);
    assert_eq!(session.pending_mode, ControlMode::Palette);
}

#[test]
fn test_apply_settings_reports_address_change() {
    let mut session = Session::new("ctx", settings("192.168.1.50"));
    assert!(!session.apply_settings(settings("http://192.168.1.50/")));
    assert!(session.apply_settings(settings("192.168.1.51")));
    assert!(session.apply_settings(settings("")));
    assert!(!session.is_configured());
}

#[test]
fn test_snapshot_replaces_state_and_clears_error() {
    let mut session = Session::new("ctx", settings("192.168.1.50"));
    session.mark_offline();

    session.apply_snapshot(
        DeviceSnapshot::from_json(&sample_payload(true, 128)).unwrap(),
        Some(vec![preset(1, "A")]),
    );

    assert!(!session.connection_error);
    assert_eq!(session.state.as_ref().unwrap().brightness, 128);
    assert_eq!(session.device_name, "Test Strip");
    assert_eq!(session.effects.len(), 4);
    assert_eq!(session.presets.len(), 1);
    assert_eq!(session.last_good_brightness, 128);
}

#[test]
fn test_failed_presets_keep_previous_list() {
    let mut session = polled_session(sample_payload(true, 10));
    session.presets = vec![preset(3, "Kept")];

    session.apply_snapshot(DeviceSnapshot::from_json(&sample_payload(true, 20)).unwrap(), None);
    assert_eq!(session.presets, vec![preset(3, "Kept")]);
}

#[test]
fn test_relay_detection_writes_back_only_on_change() {
    let mut session = Session::new("ctx", settings("192.168.1.50"));

    // First poll without relays still establishes the mirror
    let changed = session.apply_snapshot(
        DeviceSnapshot::from_json(&sample_payload(true, 10)).unwrap(),
        None,
    );
    assert!(changed);
    assert_eq!(session.settings.has_multi_relay, Some(false));
    assert_eq!(session.settings.relay_count, Some(0));

    let changed = session.apply_snapshot(
        DeviceSnapshot::from_json(&sample_payload(true, 10)).unwrap(),
        None,
    );
    assert!(!changed);

    let changed = session.apply_snapshot(
        DeviceSnapshot::from_json(&sample_payload_with_relays(10, &[false, true])).unwrap(),
        None,
    );
    assert!(changed);
    assert!(session.has_relay_module);
    assert_eq!(session.relay_count, 2);
    assert_eq!(session.settings.relay_count, Some(2));
    // Target relay defaults to id 0
    assert!(!session.relay_state);
}

#[test]
fn test_relay_target_comes_from_settings() {
    let mut session = Session::new(
        "ctx",
        ActionSettings {
            ip_address: Some("192.168.1.50".into()),
            relay_id: Some("1".into()),
            ..Default::default()
        },
    );
    session.apply_snapshot(
        DeviceSnapshot::from_json(&sample_payload_with_relays(10, &[false, true])).unwrap(),
        None,
    );
    assert!(session.relay_state);
}

#[test]
fn test_brightness_is_clamped_at_both_ends() {
    let mut session = polled_session(sample_payload(true, 250));

    for _ in 0..5 {
        assert_eq!(session.adjust_brightness(3, 10), StatePatch::power_on(255));
    }
    assert_eq!(session.state.as_ref().unwrap().brightness, 255);

    for _ in 0..40 {
        session.adjust_brightness(-1, 10);
    }
    assert_eq!(session.state.as_ref().unwrap().brightness, 0);
    assert_eq!(session.adjust_brightness(-1, 10), StatePatch::power_on(0));
}

#[test]
fn test_brightness_without_state_synthesizes_on_state() {
    let mut session = Session::new("ctx", settings("192.168.1.50"));
    let patch = session.adjust_brightness(2, 10);

    assert_eq!(patch, StatePatch::power_on(20));
    let state = session.state.as_ref().unwrap();
    assert!(state.on);
    assert_eq!(state.brightness, 20);
    assert_eq!(state.segments.len(), 1);
}

#[test]
fn test_effect_wraps_at_both_boundaries() {
    let mut session = polled_session(sample_payload(true, 100));
    assert_eq!(session.effects.len(), 4);

    assert_eq!(session.step_effect(-1), Some(StatePatch::effect(3)));
    assert_eq!(session.step_effect(1), Some(StatePatch::effect(0)));
    assert_eq!(session.step_effect(6), Some(StatePatch::effect(2)));
    assert_eq!(
        session.state.as_ref().unwrap().segments[0].effect_id,
        2
    );
}

#[test]
fn test_palette_wraps_and_empty_catalog_is_noop() {
    let mut session = polled_session(sample_payload(true, 100));
    assert_eq!(session.step_palette(-1), Some(StatePatch::palette(2)));

    session.palettes.clear();
    assert_eq!(session.step_palette(1), None);
    assert_eq!(session.state.as_ref().unwrap().segments[0].palette_id, 2);
}

#[test]
fn test_effect_without_state_is_noop() {
    let mut session = Session::new("ctx", settings("192.168.1.50"));
    session.effects = vec!["Solid".into()];
    assert_eq!(session.step_effect(1), None);
}

#[test]
fn test_preset_stepping_wraps_and_defaults_to_first() {
    let mut session = polled_session(sample_payload(true, 100));
    session.presets = vec![preset(2, "A"), preset(5, "B"), preset(9, "C")];

    // Device reports ps -1, so position defaults to the first entry
    assert_eq!(session.step_preset(-1), Some(StatePatch::preset(9)));
    assert_eq!(session.step_preset(1), Some(StatePatch::preset(2)));
    assert_eq!(session.step_preset(1), Some(StatePatch::preset(5)));
    assert_eq!(session.state.as_ref().unwrap().preset_id, 5);
    assert_eq!(session.last_good_preset, 5);

    session.presets.clear();
    assert_eq!(session.step_preset(1), None);
}

#[test]
fn test_relay_requires_module_and_only_sends_changes() {
    let mut session = polled_session(sample_payload(true, 100));
    assert_eq!(session.set_relay(1), None);

    let mut session = polled_session(sample_payload_with_relays(100, &[false]));
    assert_eq!(session.set_relay(3), Some(StatePatch::relay(0, true)));
    assert_eq!(session.set_relay(1), None);
    assert_eq!(session.set_relay(-2), Some(StatePatch::relay(0, false)));
    assert_eq!(session.set_relay(-1), None);
}

#[test]
fn test_menu_round_trip_without_rotation_commits_same_mode() {
    let mut session = polled_session(sample_payload(true, 100));
    session.mode = ControlMode::Effect;

    session.open_menu();
    assert!(session.selecting);
    assert_eq!(session.pending_mode, ControlMode::Effect);

    assert_eq!(session.commit_menu(), ControlMode::Effect);
    assert!(!session.selecting);
    assert_eq!(session.settings.mode, Some(ControlMode::Effect));
}

#[test]
fn test_menu_cycle_wraps_and_gates_relay() {
    let mut session = polled_session(sample_payload(true, 100));
    session.open_menu();

    session.cycle_pending(-1);
    assert_eq!(session.pending_mode, ControlMode::Palette);
    session.cycle_pending(1);
    assert_eq!(session.pending_mode, ControlMode::Brightness);

    let mut session = polled_session(sample_payload_with_relays(100, &[true]));
    session.open_menu();
    session.cycle_pending(-1);
    assert_eq!(session.pending_mode, ControlMode::Relay);
    session.cycle_pending(5);
    assert_eq!(session.pending_mode, ControlMode::Brightness);
}

#[test]
fn test_cancel_menu_reverts_pending() {
    let mut session = polled_session(sample_payload(true, 100));
    session.open_menu();
    session.cycle_pending(1);
    assert_eq!(session.pending_mode, ControlMode::Effect);

    session.cancel_menu();
    assert!(!session.selecting);
    assert_eq!(session.pending_mode, ControlMode::Brightness);
    assert_eq!(session.mode, ControlMode::Brightness);
}

#[test]
fn test_open_menu_on_unavailable_relay_mode_highlights_brightness() {
    let mut session = polled_session(sample_payload(true, 100));
    session.mode = ControlMode::Relay;
    session.open_menu();
    assert_eq!(session.pending_mode, ControlMode::Brightness);
}

#[test]
fn test_relay_module_vanishing_while_selecting_resets_pending() {
    let mut session = polled_session(sample_payload_with_relays(100, &[true]));
    session.open_menu();
    session.cycle_pending(-1);
    assert_eq!(session.pending_mode, ControlMode::Relay);

    session.apply_snapshot(DeviceSnapshot::from_json(&sample_payload(true, 100)).unwrap(), None);
    assert_eq!(session.pending_mode, ControlMode::Brightness);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_soft_off_then_restore() {
    let mut session = polled_session(sample_payload(true, 180));
    let t0 = Instant::now();

    assert_eq!(
        session.toggle_power(t0, DEBOUNCE, 128),
        Some(StatePatch::brightness(0))
    );
    let state = session.state.as_ref().unwrap();
    assert!(state.on, "soft off leaves the power flag alone");
    assert_eq!(state.brightness, 0);
    assert_eq!(session.last_good_brightness, 180);

    assert_eq!(
        session.toggle_power(t0 + DEBOUNCE, DEBOUNCE, 128),
        Some(StatePatch::power_on(180))
    );
}

#[tokio::test(start_paused = true)]
async fn test_toggle_restores_default_when_nothing_remembered() {
    let mut session = polled_session(sample_payload(false, 0));
    assert_eq!(session.last_good_brightness, 0);

    assert_eq!(
        session.toggle_power(Instant::now(), DEBOUNCE, 128),
        Some(StatePatch::power_on(128))
    );
}

#[tokio::test(start_paused = true)]
async fn test_toggle_debounce() {
    let mut session = polled_session(sample_payload(true, 90));
    let t0 = Instant::now();

    assert!(session.toggle_power(t0, DEBOUNCE, 128).is_some());
    assert!(session
        .toggle_power(t0 + Duration::from_millis(499), DEBOUNCE, 128)
        .is_none());
    // Ignored taps don't move the debounce window
    assert!(session
        .toggle_power(t0 + Duration::from_millis(500), DEBOUNCE, 128)
        .is_some());
    assert!(session
        .toggle_power(t0 + Duration::from_millis(1000), DEBOUNCE, 128)
        .is_some());
    assert_eq!(session.state.as_ref().unwrap().brightness, 0);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_requires_state() {
    let mut session = Session::new("ctx", settings("192.168.1.50"));
    assert!(session
        .toggle_power(Instant::now(), DEBOUNCE, 128)
        .is_none());
    assert!(session.last_toggle.is_none());
}

#[test]
fn test_snapshot_without_state_is_partial_success() {
    let mut session = Session::new("ctx", settings("192.168.1.50"));
    session.mark_offline();
    session.apply_snapshot(
        DeviceSnapshot::from_json(&json!({"info": {"name": "Only Info"}})).unwrap(),
        None,
    );
    assert!(!session.connection_error);
    assert!(session.state.is_none());
    assert_eq!(session.device_name, "Only Info");
}

#[tokio::test]
async fn test_handle_teardown_aborts_tasks_and_bumps_tokens() {
    let mut handle = SessionHandle::new(Session::new("ctx", settings("wled")), Epochs::default());
    handle.poll_task = Some(tokio::spawn(std::future::pending::<()>()));
    handle.selection_task = Some(tokio::spawn(std::future::pending::<()>()));
    handle.session.polling = true;
    let generation = handle.session.poll_generation;
    let token = handle.session.selection_token;

    handle.teardown();

    assert!(handle.poll_task.is_none());
    assert!(handle.selection_task.is_none());
    assert!(!handle.session.polling);
    assert!(handle.session.poll_generation > generation);
    assert!(handle.session.selection_token > token);
}

#[test]
fn test_epochs_are_shared_between_handles() {
    let epochs = Epochs::default();
    let mut first = SessionHandle::new(Session::new("ctx", settings("wled")), epochs.clone());
    first.teardown();
    let (old_generation, old_token) = (first.session.poll_generation, first.session.selection_token);

    let mut second = SessionHandle::new(Session::new("ctx", settings("wled")), epochs);
    second.stop_polling();
    second.cancel_selection_timer();

    assert!(second.session.poll_generation > old_generation);
    assert!(second.session.selection_token > old_token);
}
