//! Test utilities for device I/O
//!
//! [`FakeDeviceClient`] stands in for real hardware in session and scanner
//! tests. [`StubServer`] is a minimal HTTP/1.1 responder for exercising the
//! reqwest path end to end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use wled_core::prelude::*;
use wled_core::DeviceAddress;

use crate::client::DeviceClient;
use crate::protocol::{DeviceSnapshot, DiscoveredDevice, Preset, StatePatch};

// ─────────────────────────────────────────────────────────────────
// Fake client
// ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeState {
    snapshot: Option<DeviceSnapshot>,
    presets: Vec<Preset>,
    fail_presets: bool,
    fail_commands: bool,
    reachable: HashMap<String, String>,
    identify_delay: Duration,
    sent: Vec<(String, StatePatch)>,
}

/// Scriptable in-memory [`DeviceClient`].
///
/// Clones share state, so a test can keep one handle while the engine owns
/// another. Snapshot fetches fail with a timeout until [`set_snapshot`] is
/// called.
///
/// [`set_snapshot`]: FakeDeviceClient::set_snapshot
#[derive(Clone, Default)]
pub struct FakeDeviceClient {
    state: Arc<Mutex<FakeState>>,
    snapshot_calls: Arc<AtomicUsize>,
    identify_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeDeviceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client that answers `GET /json` with `payload`
    pub fn with_json(payload: Value) -> Self {
        let client = Self::new();
        client.set_json(payload);
        client
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_snapshot(&self, snapshot: DeviceSnapshot) {
        self.lock().snapshot = Some(snapshot);
    }

    /// Parse `payload` as a `/json` response and serve it
    pub fn set_json(&self, payload: Value) {
        let snapshot = DeviceSnapshot::from_json(&payload).expect("fake payload must be an object");
        self.set_snapshot(snapshot);
    }

    /// Make every following snapshot fetch time out
    pub fn go_offline(&self) {
        self.lock().snapshot = None;
    }

    pub fn set_presets(&self, presets: Vec<Preset>) {
        self.lock().presets = presets;
    }

    pub fn fail_presets(&self, fail: bool) {
        self.lock().fail_presets = fail;
    }

    pub fn fail_commands(&self, fail: bool) {
        self.lock().fail_commands = fail;
    }

    /// Make `host` answer identity probes with `name`
    pub fn add_reachable(&self, host: &str, name: &str) {
        self.lock()
            .reachable
            .insert(host.to_string(), name.to_string());
    }

    /// Delay every identity probe by `delay` before answering
    pub fn set_identify_delay(&self, delay: Duration) {
        self.lock().identify_delay = delay;
    }

    /// Patches sent so far, with the target address
    pub fn sent_patches(&self) -> Vec<(String, StatePatch)> {
        self.lock().sent.clone()
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn identify_calls(&self) -> usize {
        self.identify_calls.load(Ordering::SeqCst)
    }

    /// Highest number of identity probes observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl DeviceClient for FakeDeviceClient {
    async fn fetch_snapshot(&self, address: &DeviceAddress) -> Result<DeviceSnapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.lock().snapshot.clone();
        snapshot.ok_or_else(|| Error::probe_timeout(address.url("/json"), 3000))
    }

    async fn fetch_presets(&self, address: &DeviceAddress) -> Result<Vec<Preset>> {
        let state = self.lock();
        if state.fail_presets || state.snapshot.is_none() {
            return Err(Error::probe_transport(
                address.url("/presets.json"),
                "connection reset",
            ));
        }
        Ok(state.presets.clone())
    }

    async fn send_state(&self, address: &DeviceAddress, patch: &StatePatch) -> Result<()> {
        let mut state = self.lock();
        state.sent.push((address.to_string(), patch.clone()));
        if state.fail_commands {
            return Err(Error::probe_transport(
                address.url("/json/state"),
                "connection refused",
            ));
        }
        Ok(())
    }

    async fn identify(&self, host: &str) -> Result<DiscoveredDevice> {
        self.identify_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (delay, name) = {
            let state = self.lock();
            (state.identify_delay, state.reachable.get(host).cloned())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match name {
            Some(name) => Ok(DiscoveredDevice {
                address: host.to_string(),
                name,
            }),
            None => Err(Error::probe_timeout(format!("http://{}/json/info", host), 1500)),
        }
    }
}

/// A `/json` payload with the given power and brightness and a small catalog
pub fn sample_payload(on: bool, brightness: u8) -> Value {
    serde_json::json!({
        "state": {
            "on": on,
            "bri": brightness,
            "ps": -1,
            "pl": -1,
            "seg": [{"fx": 0, "pal": 0, "sx": 128, "ix": 128}]
        },
        "info": {"name": "Test Strip", "ver": "0.14.4"},
        "effects": ["Solid", "Blink", "Breathe", "Wipe"],
        "palettes": ["Default", "Random Cycle", "Rainbow"]
    })
}

/// Same as [`sample_payload`] with a relay block
pub fn sample_payload_with_relays(brightness: u8, relay_states: &[bool]) -> Value {
    let mut payload = sample_payload(true, brightness);
    let relays: Vec<Value> = relay_states
        .iter()
        .enumerate()
        .map(|(i, on)| serde_json::json!({"relay": i, "state": on}))
        .collect();
    payload["state"]["MultiRelay"] = serde_json::json!({ "relays": relays });
    payload
}

pub fn preset(id: u32, name: &str) -> Preset {
    Preset {
        id,
        name: name.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────
// Stub HTTP server
// ─────────────────────────────────────────────────────────────────

/// A request the stub server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
}

type Routes = HashMap<(String, String), (u16, Value)>;

/// Builder for [`StubServer`]
#[derive(Default)]
pub struct StubServerBuilder {
    routes: Routes,
}

impl StubServerBuilder {
    pub fn route(mut self, method: &str, path: &str, status: u16, body: Value) -> Self {
        self.routes
            .insert((method.to_string(), path.to_string()), (status, body));
        self
    }

    /// Bind an ephemeral localhost port and start answering
    pub async fn start(self) -> std::io::Result<StubServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let host = listener.local_addr()?.to_string();
        let routes = Arc::new(self.routes);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let _ = answer(stream, &routes, &recorded).await;
                });
            }
        });

        Ok(StubServer {
            host,
            requests,
            task,
        })
    }
}

/// Localhost HTTP server with canned JSON responses. Unknown routes get 404.
pub struct StubServer {
    host: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl StubServer {
    pub fn builder() -> StubServerBuilder {
        StubServerBuilder::default()
    }

    /// A server that accepts connections and never answers
    pub async fn silent() -> std::io::Result<StubServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let host = listener.local_addr()?.to_string();
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        Ok(StubServer {
            host,
            requests: Arc::new(Mutex::new(Vec::new())),
            task,
        })
    }

    /// `127.0.0.1:<port>`
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn answer(
    mut stream: TcpStream,
    routes: &Routes,
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = serde_json::from_slice(&buf[header_end..body_end]).unwrap_or(Value::Null);

    if let Ok(mut requests) = recorded.lock() {
        requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            body,
        });
    }

    let (status, payload) = routes
        .get(&(method, path))
        .cloned()
        .unwrap_or((404, serde_json::json!({"error": "not found"})));
    let payload = payload.to_string();
    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        payload.len(),
        payload
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
