//! Utility functions for the tutoring matchmaking service

use chrono::{DateTime, Utc};
use std::net::IpAddr;
use sysinfo::Networks;
use uuid::Uuid;

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Generate a match id unique for the process lifetime.
///
/// Millisecond timestamp plus a 9-character random suffix. Collisions are
/// negligible; cryptographic uniqueness is not required.
pub fn generate_match_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..9])
}

/// Elapsed wait between enqueue time and pairing time, in fractional seconds
pub fn wait_seconds(enqueued_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - enqueued_at).num_milliseconds() as f64 / 1000.0
}

/// Non-loopback IPv4 addresses of the host, for the startup banner
pub fn lan_addresses() -> Vec<IpAddr> {
    let networks = Networks::new_with_refreshed_list();
    let mut addrs = Vec::new();
    for (_name, data) in networks.iter() {
        for network in data.ip_networks() {
            match network.addr {
                IpAddr::V4(v4) if !v4.is_loopback() => addrs.push(network.addr),
                _ => {}
            }
        }
    }
    addrs
}
