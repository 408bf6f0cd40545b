//! The hub: single owner of all matchmaking and relay state
//!
//! Every inbound event (connect, disconnect, or a parsed client event) is
//! handled as one atomic unit: the handler takes the hub's state lock, runs
//! its reads and writes to completion, and only then releases it. Outbound
//! sends are non-blocking channel pushes and the audit dispatch is
//! fire-and-forget, so nothing under the lock waits on I/O.

use crate::audit::AuditLogger;
use crate::matchmaking::{GradeQueues, PairingOutcome};
use crate::public_chat::PublicFeed;
use crate::registry::ConnectionRegistry;
use crate::session::RoomSet;
use crate::types::{ChatMessage, ConnectionId, PublicMessage, UserProfile, ANONYMOUS_NAME};
use crate::utils::{current_timestamp, generate_match_id, wait_seconds};
use crate::ws::messages::{ClientEvent, MatchNotice, ServerEvent};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Counters exposed on the health endpoint
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct HubStats {
    /// Connections accepted over the process lifetime
    pub connections_total: u64,
    /// Successful pairings over the process lifetime
    pub matches_made: u64,
    /// Session and public messages relayed over the process lifetime
    pub messages_relayed: u64,
    /// Currently open connections
    pub online: usize,
    /// Currently waiting queue entries
    pub waiting: usize,
    /// Currently active chat rooms
    pub active_rooms: usize,
}

/// Everything the hub guards with its single lock
#[derive(Debug, Default)]
struct HubState {
    registry: ConnectionRegistry,
    queues: GradeQueues,
    rooms: RoomSet,
    public_feed: PublicFeed,
    connections_total: u64,
    matches_made: u64,
    messages_relayed: u64,
}

/// The coordinating service object. Shared as `Arc<Hub>`; all mutation goes
/// through its methods.
pub struct Hub {
    state: Mutex<HubState>,
    audit: AuditLogger,
}

impl Hub {
    pub fn new(audit: AuditLogger) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            audit,
        }
    }

    /// Register a freshly accepted connection and broadcast the online set
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
        source_addr: Option<String>,
        client_agent: Option<String>,
    ) {
        {
            let mut state = self.state.lock().await;
            state
                .registry
                .insert(connection_id, sender, current_timestamp());
            state.connections_total += 1;
            let online = state.registry.online_ids();
            info!(
                "Connection '{}' opened ({} online)",
                connection_id,
                online.len()
            );
            state.registry.broadcast(ServerEvent::OnlineUsers(online));
        }

        self.audit.login(connection_id, source_addr, client_agent);
    }

    /// Tear down a closed connection: presence, queue entry, room
    /// memberships, profile. Rooms emptied by the removal are deleted.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let username = {
            let mut state = self.state.lock().await;
            let username = state.registry.username(connection_id);

            if let Some(profile) = state.registry.profile(connection_id).cloned() {
                if state.queues.cancel(connection_id, profile.grade).is_some() {
                    debug!(
                        "Dropped waiting entry for disconnected '{}' from {}",
                        connection_id, profile.grade
                    );
                }
            }

            let deleted = state.rooms.remove_connection(connection_id);
            for match_id in &deleted {
                info!("Deleted emptied room '{}'", match_id);
            }

            state.registry.remove(connection_id);
            let online = state.registry.online_ids();
            info!(
                "Connection '{}' closed ({} online)",
                connection_id,
                online.len()
            );
            state.registry.broadcast(ServerEvent::OnlineUsers(online));
            username
        };

        self.audit.logout(connection_id, username);
    }

    /// Dispatch one parsed client event
    pub async fn handle_event(&self, connection_id: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::RequestOnlineUsers => self.request_online_users(connection_id).await,
            ClientEvent::FindMatch(request) => {
                let profile = UserProfile {
                    username: request.username,
                    grade: request.grade,
                    subject: request.subject,
                    role: request.role,
                };
                self.find_match(connection_id, profile).await
            }
            ClientEvent::CancelMatch => self.cancel_match(connection_id).await,
            ClientEvent::PublicMessage(body) => self.public_message(connection_id, body).await,
            ClientEvent::JoinPublicChat => self.join_public_chat(connection_id).await,
            ClientEvent::JoinChat { match_id } => self.join_chat(connection_id, &match_id).await,
            ClientEvent::ChatMessage { match_id, message } => {
                self.chat_message(connection_id, &match_id, message).await
            }
        }
    }

    /// Reply with the current online set, to the caller only
    async fn request_online_users(&self, connection_id: ConnectionId) {
        let state = self.state.lock().await;
        let online = state.registry.online_ids();
        state
            .registry
            .send_to(connection_id, ServerEvent::OnlineUsers(online));
    }

    /// Attach the profile and run the pairing algorithm
    async fn find_match(&self, connection_id: ConnectionId, profile: UserProfile) {
        let mut state = self.state.lock().await;
        let now = current_timestamp();

        info!(
            "Match request from '{}' - grade: {}, subject: '{}', role: {}",
            connection_id, profile.grade, profile.subject, profile.role
        );
        state.registry.set_profile(connection_id, profile.clone());

        match state.queues.pair_or_enqueue(connection_id, &profile, now) {
            PairingOutcome::Enqueued => {
                info!(
                    "No candidate for '{}'; now waiting in {} ({} in bucket)",
                    connection_id,
                    profile.grade,
                    state.queues.bucket_len(profile.grade)
                );
            }
            PairingOutcome::Paired { partner } => {
                let match_id = generate_match_id();
                let waited = wait_seconds(partner.enqueued_at, now);
                info!(
                    "Matched '{}' with '{}' - match_id: {}, waited: {:.1}s",
                    connection_id, partner.connection_id, match_id, waited
                );

                state.rooms.create_for_match(
                    match_id.clone(),
                    [connection_id, partner.connection_id],
                    now,
                );
                state.matches_made += 1;

                // Each side learns about the other
                state.registry.send_to(
                    connection_id,
                    ServerEvent::MatchFound(MatchNotice {
                        match_id: match_id.clone(),
                        wait_seconds: waited,
                        partner_name: partner.profile.username.clone(),
                        partner_role: partner.profile.role,
                    }),
                );
                state.registry.send_to(
                    partner.connection_id,
                    ServerEvent::MatchFound(MatchNotice {
                        match_id,
                        wait_seconds: waited,
                        partner_name: profile.username,
                        partner_role: profile.role,
                    }),
                );
            }
        }
    }

    /// Remove the caller's waiting entry, if any
    async fn cancel_match(&self, connection_id: ConnectionId) {
        let mut state = self.state.lock().await;
        let grade = match state.registry.profile(connection_id) {
            Some(profile) => profile.grade,
            None => {
                debug!("Cancel from '{}' without a profile; ignored", connection_id);
                return;
            }
        };
        if state.queues.cancel(connection_id, grade).is_some() {
            info!("Cancelled match request for '{}'", connection_id);
        }
    }

    /// Append to the public feed and broadcast to every connection
    async fn public_message(&self, connection_id: ConnectionId, body: String) {
        let username = {
            let mut state = self.state.lock().await;
            let username = state
                .registry
                .username(connection_id)
                .unwrap_or_else(|| ANONYMOUS_NAME.to_string());

            let message = PublicMessage {
                id: connection_id,
                username: username.clone(),
                message: body.clone(),
                timestamp: current_timestamp(),
            };

            state.public_feed.push(message.clone());
            state.messages_relayed += 1;
            state
                .registry
                .broadcast(ServerEvent::NewPublicMessage(message));
            username
        };

        self.audit.chat(connection_id, Some(username), &body);
    }

    /// Reply with the full public history, to the caller only
    async fn join_public_chat(&self, connection_id: ConnectionId) {
        let state = self.state.lock().await;
        let history = state.public_feed.history();
        state
            .registry
            .send_to(connection_id, ServerEvent::PublicChatHistory(history));
    }

    /// Join (or lazily create) a room
    async fn join_chat(&self, connection_id: ConnectionId, match_id: &str) {
        let mut state = self.state.lock().await;
        let effect = state.rooms.join(match_id, connection_id, current_timestamp());

        if effect.created {
            info!(
                "Room '{}' created lazily by joiner '{}'",
                match_id, connection_id
            );
        }
        if let Some(history) = effect.history_for_joiner {
            state
                .registry
                .send_to(connection_id, ServerEvent::ChatHistory(history));
        }

        // Only a joiner with a profile announces itself to the room
        if let Some(username) = state.registry.username(connection_id) {
            if let Some(room) = state.rooms.get(match_id) {
                let targets = room.broadcast_targets();
                state.registry.send_to_each(
                    &targets,
                    ServerEvent::ChatConnected {
                        partner_id: connection_id,
                        partner_name: username,
                    },
                );
            }
        }
    }

    /// Append to a room and broadcast to its members; absent rooms drop the
    /// message silently (deliberate best-effort semantics)
    async fn chat_message(&self, connection_id: ConnectionId, match_id: &str, body: String) {
        let relayed_by = {
            let mut state = self.state.lock().await;
            let username = state
                .registry
                .username(connection_id)
                .unwrap_or_else(|| ANONYMOUS_NAME.to_string());

            let message = ChatMessage {
                sender: connection_id,
                username: username.clone(),
                message: body.clone(),
                timestamp: current_timestamp(),
            };

            match state.rooms.post(match_id, message.clone()) {
                Some(targets) => {
                    state.messages_relayed += 1;
                    state
                        .registry
                        .send_to_each(&targets, ServerEvent::ChatMessage(message));
                    Some(username)
                }
                None => {
                    warn!(
                        "Dropped message from '{}' for unknown match '{}'",
                        connection_id, match_id
                    );
                    None
                }
            }
        };

        // Dropped messages leave no activity record
        if let Some(username) = relayed_by {
            self.audit.chat(connection_id, Some(username), &body);
        }
    }

    /// Snapshot of the hub's counters
    pub async fn stats(&self) -> HubStats {
        let state = self.state.lock().await;
        HubStats {
            connections_total: state.connections_total,
            matches_made: state.matches_made,
            messages_relayed: state.messages_relayed,
            online: state.registry.online_count(),
            waiting: state.queues.waiting_count(),
            active_rooms: state.rooms.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditStore;
    use crate::types::AuditKind;
    use std::sync::Arc;
    use tokio::time::{sleep, Duration};
    use uuid::Uuid;

    async fn test_hub() -> (Arc<Hub>, Arc<MemoryAuditStore>) {
        let store = Arc::new(MemoryAuditStore::new());
        let hub = Arc::new(Hub::new(AuditLogger::spawn(store.clone())));
        (hub, store)
    }

    async fn connect(hub: &Hub) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        hub.connect(id, tx, None, None).await;
        (id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_connect_broadcasts_online_set() {
        let (hub, _) = test_hub().await;
        let (_a, mut rx_a) = connect(&hub).await;
        let (_b, _rx_b) = connect(&hub).await;

        let events = drain(&mut rx_a);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], ServerEvent::OnlineUsers(ids) if ids.len() == 2));
    }

    #[tokio::test]
    async fn test_disconnect_cascade_clears_everything() {
        let (hub, _) = test_hub().await;
        let (a, _rx_a) = connect(&hub).await;
        let (b, mut rx_b) = connect(&hub).await;

        hub.handle_event(
            a,
            serde_json::from_str(
                r#"{"event":"find_match","data":{"username":"alice","grade":"m5","subject":"math","role":"student"}}"#,
            )
            .unwrap(),
        )
        .await;
        assert_eq!(hub.stats().await.waiting, 1);

        hub.disconnect(a).await;

        let stats = hub.stats().await;
        assert_eq!(stats.online, 1);
        assert_eq!(stats.waiting, 0);
        assert_eq!(stats.active_rooms, 0);

        let events = drain(&mut rx_b);
        assert!(matches!(
            events.last().unwrap(),
            ServerEvent::OnlineUsers(ids) if ids == &vec![b]
        ));
    }

    #[tokio::test]
    async fn test_audit_records_fired_for_lifecycle_and_chat() {
        let (hub, store) = test_hub().await;
        let (a, _rx) = connect(&hub).await;
        hub.handle_event(a, ClientEvent::PublicMessage("hi".to_string()))
            .await;
        hub.disconnect(a).await;

        sleep(Duration::from_millis(50)).await;
        assert_eq!(store.count_of(AuditKind::Login), 1);
        assert_eq!(store.count_of(AuditKind::Chat), 1);
        assert_eq!(store.count_of(AuditKind::Logout), 1);
    }
}
