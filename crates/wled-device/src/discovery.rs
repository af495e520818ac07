//! Network discovery
//!
//! Home networks rarely answer mDNS reliably, so discovery sweeps every host
//! of each local /24 with a short per-host deadline, a fixed number of probes
//! at a time.

use std::collections::HashSet;
use std::future::Future;
use std::net::Ipv4Addr;

use futures_util::future::join_all;
use if_addrs::{get_if_addrs, IfAddr};
use ipnet::Ipv4Net;
use wled_core::prelude::*;

use crate::client::DeviceClient;
use crate::protocol::DiscoveredDevice;

/// Probes in flight per batch
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// A full /24 must fit in one batch
pub const MIN_BATCH_SIZE: usize = 254;

/// Router defaults seen most often, probed first
pub const DEFAULT_PRIORITY_PREFIXES: [&str; 3] = ["192.168.178", "192.168.1", "192.168.0"];

/// Names WLED answers to out of the box
pub const WELL_KNOWN_HOSTS: [&str; 2] = ["wled.local", "wled-light.local"];

/// Scanner tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub batch_size: usize,
    pub priority_prefixes: Vec<String>,
    pub well_known_hosts: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            priority_prefixes: DEFAULT_PRIORITY_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            well_known_hosts: WELL_KNOWN_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl ScanOptions {
    /// Configured batch size, raised to [`MIN_BATCH_SIZE`] if smaller
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(MIN_BATCH_SIZE)
    }
}

/// /24 networks of every active non-loopback IPv4 interface, deduplicated
pub fn local_subnets() -> Result<Vec<Ipv4Net>> {
    let interfaces = get_if_addrs()
        .map_err(|e| Error::discovery(format!("failed to enumerate network interfaces: {}", e)))?;

    let mut seen = HashSet::new();
    let mut subnets = Vec::new();

    for interface in interfaces {
        if interface.is_loopback() {
            continue;
        }
        let IfAddr::V4(v4) = interface.addr else {
            continue;
        };

        let net = Ipv4Net::new(v4.ip, 24)
            .map_err(|e| Error::discovery(format!("invalid /24 for {}: {}", v4.ip, e)))?
            .trunc();
        if seen.insert(net) {
            debug!("Discovery subnet {} via {}", net, interface.name);
            subnets.push(net);
        }
    }

    Ok(subnets)
}

/// Dotted prefix of a /24 without its last octet, e.g. `192.168.1`
fn prefix_of(net: &Ipv4Net) -> String {
    let [a, b, c, _] = net.network().octets();
    format!("{}.{}.{}", a, b, c)
}

/// Stable sort putting prefixes from `priority` first, in `priority` order
pub fn prioritize_subnets(subnets: &mut [Ipv4Net], priority: &[String]) {
    subnets.sort_by_key(|net| {
        let prefix = prefix_of(net);
        priority
            .iter()
            .position(|p| *p == prefix)
            .unwrap_or(priority.len())
    });
}

/// Well-known hostnames, then `.1` through `.254` of each subnet in order
pub fn build_candidates(subnets: &[Ipv4Net], well_known_hosts: &[String]) -> Vec<String> {
    let mut candidates: Vec<String> = well_known_hosts.to_vec();
    for net in subnets {
        candidates.extend(net.hosts().map(|ip: Ipv4Addr| ip.to_string()));
    }
    candidates
}

/// Probe `candidates` in sequential batches of `batch_size`.
///
/// At most `batch_size` probes are in flight at once. Failed probes are
/// dropped; results are deduplicated by address in first-seen order.
pub async fn scan_candidates<F, Fut>(
    candidates: &[String],
    batch_size: usize,
    probe: F,
) -> Vec<DiscoveredDevice>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<DiscoveredDevice>>,
{
    let batch_size = batch_size.max(1);
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for (index, batch) in candidates.chunks(batch_size).enumerate() {
        trace!("Probing discovery batch {} ({} hosts)", index, batch.len());
        let results = join_all(batch.iter().cloned().map(&probe)).await;

        for result in results {
            match result {
                Ok(device) => {
                    if seen.insert(device.address.clone()) {
                        info!("Found WLED device {} at {}", device.name, device.address);
                        found.push(device);
                    }
                }
                Err(e) => trace!("Discovery probe failed: {}", e),
            }
        }
    }

    found
}

/// Sweep the local network for WLED devices.
///
/// Never fails: interface enumeration errors leave only the well-known
/// hostnames to probe.
pub async fn scan<C: DeviceClient + Sync>(client: &C, options: &ScanOptions) -> Vec<DiscoveredDevice> {
    let mut subnets = match local_subnets() {
        Ok(subnets) => subnets,
        Err(e) => {
            warn!("Discovery falling back to well-known hosts: {}", e);
            Vec::new()
        }
    };
    prioritize_subnets(&mut subnets, &options.priority_prefixes);

    let candidates = build_candidates(&subnets, &options.well_known_hosts);
    info!(
        "Scanning {} candidates across {} subnet(s)",
        candidates.len(),
        subnets.len()
    );

    let devices = scan_candidates(&candidates, options.effective_batch_size(), |host| async move {
        client.identify(&host).await
    })
    .await;

    info!("Discovery finished: {} device(s)", devices.len());
    devices
}
