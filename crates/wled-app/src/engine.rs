//! Engine - owns the application state and the single message loop
//!
//! Host events, poll results and timer expiries all arrive on one channel
//! and are processed one at a time, so handlers for a context never
//! interleave.

use std::sync::Arc;

use tokio::sync::mpsc;
use wled_core::prelude::*;
use wled_device::DeviceClient;

use crate::config::AppConfig;
use crate::host::HostBridge;
use crate::message::Message;
use crate::process;
use crate::state::AppState;

/// Capacity of the message channel
pub const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Orchestration engine for dial sessions.
pub struct Engine<C, H: ?Sized> {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the message channel.
    /// Clone this to give to input sources.
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the message channel
    pub msg_rx: mpsc::Receiver<Message>,

    client: Arc<C>,

    host: Arc<H>,
}

impl<C, H> Engine<C, H>
where
    C: DeviceClient + Send + Sync + 'static,
    H: HostBridge + ?Sized,
{
    pub fn new(config: AppConfig, client: Arc<C>, host: Arc<H>) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);
        Self {
            state: AppState::with_config(config),
            msg_tx,
            msg_rx,
            client,
            host,
        }
    }

    /// Process a single message through the TEA update cycle.
    pub fn process_message(&mut self, msg: Message) {
        process::process_message(&mut self.state, msg, &self.msg_tx, &self.client, &*self.host);
    }

    /// Drain and process all pending messages from the channel.
    ///
    /// Returns the number of messages processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Get a clone of the message sender for spawning input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    /// Check if the application should quit.
    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Process messages until a `Shutdown` message arrives
    pub async fn run(&mut self) {
        info!("Engine started");
        while let Some(msg) = self.msg_rx.recv().await {
            self.process_message(msg);
            if self.should_quit() {
                break;
            }
        }
        self.shutdown();
    }

    /// Tear down every session, aborting their tasks.
    pub fn shutdown(&mut self) {
        let count = self.state.sessions.len();
        self.state.sessions.clear();
        info!("Engine stopped ({} session(s) torn down)", count);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use wled_core::ControlMode;
    use wled_device::test_utils::{sample_payload, FakeDeviceClient};
    use wled_device::StatePatch;

    use super::*;
    use crate::config::ActionSettings;

    #[derive(Default)]
    struct RecordingHost {
        settings: Mutex<Vec<(String, ActionSettings)>>,
        feedback: Mutex<Vec<(String, String)>>,
    }

    impl RecordingHost {
        fn last_svg(&self) -> String {
            let feedback = self.feedback.lock().unwrap();
            let (_, uri) = feedback.last().expect("no feedback");
            let encoded = uri.strip_prefix("data:image/svg+xml;base64,").unwrap();
            String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap()
        }

        fn feedback_count(&self) -> usize {
            self.feedback.lock().unwrap().len()
        }

        fn persisted(&self) -> Vec<(String, ActionSettings)> {
            self.settings.lock().unwrap().clone()
        }
    }

    impl HostBridge for RecordingHost {
        fn set_settings(&self, context: &str, settings: &ActionSettings) {
            self.settings
                .lock()
                .unwrap()
                .push((context.to_string(), settings.clone()));
        }

        fn set_feedback(&self, context: &str, image: &str) {
            self.feedback
                .lock()
                .unwrap()
                .push((context.to_string(), image.to_string()));
        }
    }

    type TestEngine = Engine<FakeDeviceClient, RecordingHost>;

    fn engine(client: FakeDeviceClient) -> (TestEngine, Arc<RecordingHost>) {
        let host = Arc::new(RecordingHost::default());
        let engine = Engine::new(AppConfig::default(), Arc::new(client), Arc::clone(&host));
        (engine, host)
    }

    fn appear(address: &str) -> Message {
        Message::Appear {
            context: "dial".into(),
            settings: ActionSettings {
                ip_address: Some(address.into()),
                ..Default::default()
            },
        }
    }

    /// Receive and process the next queued message
    async fn step(engine: &mut TestEngine) -> Message {
        let msg = engine.msg_rx.recv().await.unwrap();
        engine.process_message(msg.clone());
        msg
    }

    /// Let spawned fire-and-forget tasks run
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_renders_brightness() {
        let (mut engine, host) = engine(FakeDeviceClient::with_json(sample_payload(true, 128)));

        engine.process_message(appear("192.168.1.50"));
        assert!(host.last_svg().contains("Loading..."));

        let msg = step(&mut engine).await;
        assert!(matches!(msg, Message::PollCompleted { .. }));

        let svg = host.last_svg();
        assert!(svg.contains("Test Strip"));
        assert!(svg.contains(">50%<"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_then_recovered() {
        let client = FakeDeviceClient::new();
        let (mut engine, host) = engine(client.clone());

        engine.process_message(appear("192.168.1.50"));
        step(&mut engine).await;
        assert!(host.last_svg().contains("NO CONN"));
        assert!(engine.state.sessions.get("dial").unwrap().session.connection_error);

        client.set_json(sample_payload(true, 255));
        let start = tokio::time::Instant::now();
        step(&mut engine).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(host.last_svg().contains(">100%<"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failed_polls_stay_offline_without_backoff() {
        let client = FakeDeviceClient::with_json(sample_payload(true, 128));
        let (mut engine, host) = engine(client.clone());

        engine.process_message(appear("192.168.1.50"));
        step(&mut engine).await;
        assert!(host.last_svg().contains(">50%<"));

        client.go_offline();
        for cycle in 1..=3 {
            let start = tokio::time::Instant::now();
            let msg = step(&mut engine).await;
            let elapsed = start.elapsed();

            assert!(
                matches!(msg, Message::PollCompleted { .. }),
                "cycle {}",
                cycle
            );
            assert!(elapsed >= Duration::from_secs(3), "cycle {}: {:?}", cycle, elapsed);
            assert!(elapsed < Duration::from_secs(4), "cycle {}: {:?}", cycle, elapsed);

            let session = &engine.state.sessions.get("dial").unwrap().session;
            assert!(session.connection_error);
            assert!(session.polling);
            assert_eq!(session.state.as_ref().unwrap().brightness, 128);
            assert!(host.last_svg().contains("NO CONN"));
        }
        assert_eq!(client.snapshot_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_times_out_without_commit() {
        let (mut engine, host) = engine(FakeDeviceClient::new());
        engine.process_message(appear(""));
        engine.process_message(Message::Press {
            context: "dial".into(),
        });
        engine.process_message(Message::Rotate {
            context: "dial".into(),
            ticks: 1,
        });

        let start = tokio::time::Instant::now();
        let msg = step(&mut engine).await;

        assert!(matches!(msg, Message::SelectionTimeout { .. }));
        assert!(start.elapsed() >= Duration::from_secs(3));
        let session = &engine.state.sessions.get("dial").unwrap().session;
        assert!(!session.selecting);
        assert_eq!(session.mode, ControlMode::Brightness);
        assert!(host.persisted().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_resets_selection_clock() {
        let (mut engine, _host) = engine(FakeDeviceClient::new());
        let start = tokio::time::Instant::now();
        engine.process_message(appear(""));
        engine.process_message(Message::Press {
            context: "dial".into(),
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        engine.process_message(Message::Rotate {
            context: "dial".into(),
            ticks: 1,
        });

        let msg = step(&mut engine).await;
        assert!(matches!(msg, Message::SelectionTimeout { token: 2, .. }));
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(engine.msg_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disappear_stops_polling() {
        let client = FakeDeviceClient::with_json(sample_payload(true, 10));
        let (mut engine, _host) = engine(client.clone());

        engine.process_message(appear("192.168.1.50"));
        step(&mut engine).await;
        engine.process_message(Message::Disappear {
            context: "dial".into(),
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(engine.msg_rx.try_recv().is_err());
        assert_eq!(client.snapshot_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_processes_queued_poll() {
        let (mut engine, host) = engine(FakeDeviceClient::with_json(sample_payload(true, 64)));
        engine.process_message(appear("192.168.1.50"));
        settle().await;

        assert_eq!(engine.drain_pending_messages(), 1);
        assert_eq!(host.feedback_count(), 2);
        assert_eq!(engine.drain_pending_messages(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_sends_soft_off() {
        let client = FakeDeviceClient::with_json(sample_payload(true, 180));
        let (mut engine, host) = engine(client.clone());

        engine.process_message(appear("192.168.1.50"));
        step(&mut engine).await;
        engine.process_message(Message::Tap {
            context: "dial".into(),
        });
        settle().await;

        assert_eq!(
            client.sent_patches(),
            vec![("192.168.1.50".to_string(), StatePatch::brightness(0))]
        );
        assert!(host.last_svg().contains(">OFF<"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_failure_is_swallowed() {
        let client = FakeDeviceClient::with_json(sample_payload(true, 100));
        client.fail_commands(true);
        let (mut engine, host) = engine(client.clone());

        engine.process_message(appear("192.168.1.50"));
        step(&mut engine).await;
        let before = host.feedback_count();
        engine.process_message(Message::Rotate {
            context: "dial".into(),
            ticks: 2,
        });
        settle().await;

        assert_eq!(client.sent_patches().len(), 1);
        assert_eq!(host.feedback_count(), before + 1);
        assert!(!engine.state.sessions.get("dial").unwrap().session.connection_error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_results_persisted() {
        let client = FakeDeviceClient::new();
        client.add_reachable("wled.local", "Porch");
        let (mut engine, host) = engine(client);

        engine.process_message(appear(""));
        engine.process_message(Message::Custom {
            context: "dial".into(),
            payload: serde_json::json!({"event": "startScan"}),
        });
        let msg = step(&mut engine).await;

        assert!(matches!(msg, Message::ScanCompleted { .. }));
        let persisted = host.persisted();
        let (_, settings) = persisted.last().unwrap();
        let found = settings.found_devices.as_ref().unwrap();
        assert!(found.iter().any(|d| d.address == "wled.local" && d.name == "Porch"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_on_shutdown() {
        let (mut engine, _host) = engine(FakeDeviceClient::with_json(sample_payload(true, 10)));
        engine.process_message(appear("192.168.1.50"));

        engine.msg_sender().send(Message::Shutdown).await.unwrap();
        engine.run().await;

        assert!(engine.should_quit());
        assert!(engine.state.sessions.is_empty());
    }
}
