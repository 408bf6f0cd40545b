//! Test fixtures and helpers for integration testing

use std::sync::Arc;
use tokio::sync::mpsc;
use tutor_match::audit::{AuditLogger, MemoryAuditStore};
use tutor_match::hub::Hub;
use tutor_match::types::{ConnectionId, Grade, Role};
use tutor_match::ws::messages::{ClientEvent, MatchRequest, ServerEvent};
use uuid::Uuid;

/// A fake connection: registered with the hub like a real socket, but its
/// outbound events land in a receiver the test can inspect
pub struct TestClient {
    pub id: ConnectionId,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestClient {
    /// Register a fresh connection with the hub
    pub async fn connect(hub: &Hub) -> Self {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        hub.connect(id, tx, Some("127.0.0.1".to_string()), None).await;
        Self { id, rx }
    }

    /// All events delivered so far, clearing the queue
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// The `match_found` notice among pending events, if any
    pub fn match_found(&mut self) -> Option<tutor_match::ws::messages::MatchNotice> {
        self.drain().into_iter().find_map(|event| match event {
            ServerEvent::MatchFound(notice) => Some(notice),
            _ => None,
        })
    }
}

/// Integration test setup: a hub wired to an inspectable audit store
pub async fn create_test_system() -> (Arc<Hub>, Arc<MemoryAuditStore>) {
    let store = Arc::new(MemoryAuditStore::new());
    let hub = Arc::new(Hub::new(AuditLogger::spawn(store.clone())));
    (hub, store)
}

/// Build a `find_match` event for a given profile
pub fn find_match(username: &str, grade: Grade, subject: &str, role: Role) -> ClientEvent {
    ClientEvent::FindMatch(MatchRequest {
        username: username.to_string(),
        grade,
        subject: subject.to_string(),
        role,
    })
}
