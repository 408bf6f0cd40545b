//! Connection registry and presence
//!
//! Tracks every open connection with its outbound sender, and owns the
//! connectionId → profile side table. The key set of the connection map is
//! the online set; it changes only on connect/disconnect. Outbound delivery
//! goes through per-connection unbounded channels so sends never block the
//! caller.

use crate::types::{ConnectionId, UserProfile};
use crate::ws::messages::ServerEvent;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::warn;

/// Outbound channel and metadata for one live connection
#[derive(Debug)]
pub struct ConnectionHandle {
    pub sender: mpsc::UnboundedSender<ServerEvent>,
    pub connected_at: DateTime<Utc>,
}

/// The set of live connections and their profiles
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionHandle>,
    profiles: HashMap<ConnectionId, UserProfile>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted connection
    pub fn insert(
        &mut self,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
        connected_at: DateTime<Utc>,
    ) {
        self.connections.insert(
            connection_id,
            ConnectionHandle {
                sender,
                connected_at,
            },
        );
    }

    /// Drop a closed connection and its profile
    pub fn remove(&mut self, connection_id: ConnectionId) -> Option<ConnectionHandle> {
        self.profiles.remove(&connection_id);
        self.connections.remove(&connection_id)
    }

    /// Current online set
    pub fn online_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    pub fn is_online(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }

    pub fn online_count(&self) -> usize {
        self.connections.len()
    }

    /// Attach a profile, overwriting any prior one
    pub fn set_profile(&mut self, connection_id: ConnectionId, profile: UserProfile) {
        self.profiles.insert(connection_id, profile);
    }

    pub fn profile(&self, connection_id: ConnectionId) -> Option<&UserProfile> {
        self.profiles.get(&connection_id)
    }

    /// Display name for a connection: its profile username, or none
    pub fn username(&self, connection_id: ConnectionId) -> Option<String> {
        self.profiles
            .get(&connection_id)
            .map(|profile| profile.username.clone())
    }

    /// Send to one connection; a stale or missing target is logged and skipped
    pub fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) {
        match self.connections.get(&connection_id) {
            Some(handle) => {
                if handle.sender.send(event).is_err() {
                    warn!("Failed to send event to connection '{}'", connection_id);
                }
            }
            None => {
                warn!(
                    "Dropping event for unknown connection '{}'",
                    connection_id
                );
            }
        }
    }

    /// Send to every live connection
    pub fn broadcast(&self, event: ServerEvent) {
        for (connection_id, handle) in self.connections.iter() {
            if handle.sender.send(event.clone()).is_err() {
                warn!("Failed to broadcast to connection '{}'", connection_id);
            }
        }
    }

    /// Send to a specific set of connections (e.g. a room's members)
    pub fn send_to_each(&self, targets: &[ConnectionId], event: ServerEvent) {
        for connection_id in targets {
            self.send_to(*connection_id, event.clone());
        }
    }
}
