//! Message processing
//!
//! Runs a message through the TEA update function, follows any chained
//! messages, and executes the resulting actions in order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use wled_device::DeviceClient;

use crate::actions::handle_action;
use crate::handler;
use crate::host::HostBridge;
use crate::message::Message;
use crate::state::AppState;

/// Process a message through the TEA update function
pub fn process_message<C, H>(
    state: &mut AppState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    client: &Arc<C>,
    host: &H,
) where
    C: DeviceClient + Send + Sync + 'static,
    H: HostBridge + ?Sized,
{
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m, Instant::now());
        for action in result.actions {
            handle_action(state, action, msg_tx, client, host);
        }
        msg = result.message;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionSettings;
    use crate::host::MockHostBridge;
    use wled_core::ControlMode;
    use wled_device::test_utils::FakeDeviceClient;

    #[tokio::test]
    async fn test_menu_commit_persists_mode_once() {
        let (tx, _rx) = mpsc::channel(16);
        let client = Arc::new(FakeDeviceClient::new());
        let mut state = AppState::new();

        let mut host = MockHostBridge::new();
        host.expect_set_feedback()
            .withf(|context, image| context == "dial" && image.starts_with("data:image/svg+xml;base64,"))
            .times(4)
            .return_const(());
        host.expect_set_settings()
            .withf(|context, settings| context == "dial" && settings.mode == Some(ControlMode::Effect))
            .times(1)
            .return_const(());

        let messages = [
            Message::Appear {
                context: "dial".into(),
                settings: ActionSettings::default(),
            },
            Message::Press {
                context: "dial".into(),
            },
            Message::Rotate {
                context: "dial".into(),
                ticks: 1,
            },
            Message::Press {
                context: "dial".into(),
            },
        ];
        for message in messages {
            process_message(&mut state, message, &tx, &client, &host);
        }

        let handle = state.sessions.get("dial").unwrap();
        assert_eq!(handle.session.mode, ControlMode::Effect);
        assert!(handle.selection_task.is_none());
    }

    #[tokio::test]
    async fn test_actions_for_removed_context_are_dropped() {
        let (tx, _rx) = mpsc::channel(16);
        let client = Arc::new(FakeDeviceClient::new());
        let mut state = AppState::new();
        let mut host = MockHostBridge::new();
        host.expect_set_feedback().times(0);
        host.expect_set_settings().times(0);

        handle_action(
            &mut state,
            crate::UpdateAction::Render {
                context: "gone".into(),
            },
            &tx,
            &client,
            &host,
        );
    }
}
