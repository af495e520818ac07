//! Mode-menu inactivity timer

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::message::Message;

/// Send `SelectionTimeout` after `timeout` unless aborted first
pub(super) fn spawn_selection_timer(
    context: String,
    token: u64,
    timeout: Duration,
    msg_tx: mpsc::Sender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let _ = msg_tx
            .send(Message::SelectionTimeout { context, token })
            .await;
    })
}
