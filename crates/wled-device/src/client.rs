//! HTTP access to a WLED device
//!
//! [`probe`] is the single bounded-timeout GET everything else goes through.
//! It never retries; callers decide what a failure means.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use wled_core::prelude::*;
use wled_core::DeviceAddress;

use crate::protocol::{parse_presets, DeviceSnapshot, DiscoveredDevice, Preset, StatePatch};

/// Full state, info, effect and palette names
pub const STATE_PATH: &str = "/json";
/// Stored presets keyed by id
pub const PRESETS_PATH: &str = "/presets.json";
/// Device identity, used by discovery
pub const INFO_PATH: &str = "/json/info";
/// Partial state writes
pub const STATE_WRITE_PATH: &str = "/json/state";

/// Per-request deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTimeouts {
    pub state: Duration,
    pub presets: Duration,
    pub command: Duration,
    pub identify: Duration,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            state: Duration::from_millis(3000),
            presets: Duration::from_millis(2000),
            command: Duration::from_millis(2500),
            identify: Duration::from_millis(1500),
        }
    }
}

/// GET `http://{host}{path}` and parse the body as JSON.
///
/// The whole exchange, body included, is bounded by `timeout`. Timeouts map
/// to [`Error::ProbeTimeout`], connection failures to
/// [`Error::ProbeTransport`], non-2xx responses to [`Error::ProbeStatus`] and
/// undecodable bodies to [`Error::MalformedPayload`].
pub async fn probe(http: &Client, host: &str, path: &str, timeout: Duration) -> Result<Value> {
    let url = format!("http://{}{}", host, path);

    let request = async {
        let response = http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::probe_transport(&url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::probe_status(&url, status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::malformed(format!("{}: {}", url, e)))
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(Error::probe_timeout(&url, timeout.as_millis() as u64)),
    }
}

/// POST a JSON body to `http://{host}{path}`, ignoring the response body
pub async fn post_json<B: Serialize + ?Sized>(
    http: &Client,
    host: &str,
    path: &str,
    body: &B,
    timeout: Duration,
) -> Result<()> {
    let url = format!("http://{}{}", host, path);

    let request = async {
        let response = http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::probe_transport(&url, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::probe_status(&url, status.as_u16()))
        }
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(Error::probe_timeout(&url, timeout.as_millis() as u64)),
    }
}

/// Device operations used by sessions and the scanner
///
/// `HttpDeviceClient` talks to real hardware; tests use the fake in
/// `test_utils`.
#[trait_variant::make(DeviceClient: Send)]
pub trait LocalDeviceClient {
    /// `GET /json`
    async fn fetch_snapshot(&self, address: &DeviceAddress) -> Result<DeviceSnapshot>;

    /// `GET /presets.json`
    async fn fetch_presets(&self, address: &DeviceAddress) -> Result<Vec<Preset>>;

    /// `POST /json/state`
    async fn send_state(&self, address: &DeviceAddress, patch: &StatePatch) -> Result<()>;

    /// `GET /json/info` against a scan candidate (IP or hostname)
    async fn identify(&self, host: &str) -> Result<DiscoveredDevice>;
}

/// [`DeviceClient`] backed by a shared reqwest connection pool
#[derive(Debug, Clone)]
pub struct HttpDeviceClient {
    http: Client,
    timeouts: ProbeTimeouts,
}

impl HttpDeviceClient {
    pub fn new(timeouts: ProbeTimeouts) -> Result<Self> {
        // Devices live on the LAN; a system proxy would only get in the way.
        let http = Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, timeouts })
    }
}

impl DeviceClient for HttpDeviceClient {
    async fn fetch_snapshot(&self, address: &DeviceAddress) -> Result<DeviceSnapshot> {
        let payload = probe(
            &self.http,
            address.as_str(),
            STATE_PATH,
            self.timeouts.state,
        )
        .await?;
        DeviceSnapshot::from_json(&payload)
    }

    async fn fetch_presets(&self, address: &DeviceAddress) -> Result<Vec<Preset>> {
        let payload = probe(
            &self.http,
            address.as_str(),
            PRESETS_PATH,
            self.timeouts.presets,
        )
        .await?;
        Ok(parse_presets(&payload))
    }

    async fn send_state(&self, address: &DeviceAddress, patch: &StatePatch) -> Result<()> {
        trace!("POST {} -> {}", STATE_WRITE_PATH, address);
        post_json(
            &self.http,
            address.as_str(),
            STATE_WRITE_PATH,
            patch,
            self.timeouts.command,
        )
        .await
    }

    async fn identify(&self, host: &str) -> Result<DiscoveredDevice> {
        let info = probe(&self.http, host, INFO_PATH, self.timeouts.identify).await?;
        Ok(DiscoveredDevice::from_info(host, &info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubServer;
    use serde_json::json;

    fn client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn test_probe_returns_parsed_json() {
        let server = StubServer::builder()
            .route("GET", "/json/info", 200, json!({"name": "Shelf"}))
            .start()
            .await
            .unwrap();

        let value = probe(
            &client(),
            server.host(),
            INFO_PATH,
            Duration::from_millis(1000),
        )
        .await
        .unwrap();
        assert_eq!(value["name"], "Shelf");
    }

    #[tokio::test]
    async fn test_probe_non_2xx_is_status_error() {
        let server = StubServer::builder().start().await.unwrap();

        let err = probe(&client(), server.host(), "/json", Duration::from_millis(1000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProbeStatus { status: 404, .. }));
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn test_probe_timeout_is_distinguishable() {
        let server = StubServer::silent().await.unwrap();

        let err = probe(&client(), server.host(), "/json", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }

    #[tokio::test]
    async fn test_probe_connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let host = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = probe(&client(), &host, "/json", Duration::from_millis(1000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProbeTransport { .. }));
    }

    #[tokio::test]
    async fn test_post_json_sends_state_patch() {
        let server = StubServer::builder()
            .route("POST", "/json/state", 200, json!({"success": true}))
            .start()
            .await
            .unwrap();

        post_json(
            &client(),
            server.host(),
            STATE_WRITE_PATH,
            &StatePatch::power_on(77),
            Duration::from_millis(1000),
        )
        .await
        .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/json/state");
        assert_eq!(requests[0].body, json!({"on": true, "bri": 77}));
    }

    #[tokio::test]
    async fn test_identify_falls_back_to_generic_name() {
        let server = StubServer::builder()
            .route("GET", "/json/info", 200, json!({"ver": "0.15.0"}))
            .start()
            .await
            .unwrap();
        let http = HttpDeviceClient::new(ProbeTimeouts::default()).unwrap();

        let device = DeviceClient::identify(&http, server.host()).await.unwrap();
        assert_eq!(device.address, server.host());
        assert_eq!(device.name, "Unknown WLED");
    }
}
