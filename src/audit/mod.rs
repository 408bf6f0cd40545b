//! Activity logging collaborator
//!
//! The core hands audit records (`login`, `logout`, `chat`) to an
//! [`AuditLogger`] handle, which is a plain channel send: the core never
//! awaits persistence and never observes its failures. A worker task drains
//! the channel into an [`AuditStore`]; store errors are logged here, at the
//! collaborator boundary, and go no further.

pub mod store;

pub use store::{AuditStore, MemoryAuditStore, SqliteAuditStore};

use crate::types::{AuditKind, AuditRecord, ConnectionId};
use crate::utils::current_timestamp;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Fire-and-forget handle the core uses to emit activity records
#[derive(Debug, Clone)]
pub struct AuditLogger {
    tx: mpsc::UnboundedSender<AuditRecord>,
}

impl AuditLogger {
    /// Spawn the worker task draining records into the store
    pub fn spawn(store: Arc<dyn AuditStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditRecord>();

        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let kind = record.kind;
                if let Err(e) = store.record(record).await {
                    // Collaborator failures stop here
                    error!("Failed to persist '{}' activity record: {}", kind.as_str(), e);
                } else {
                    debug!("Persisted '{}' activity record", kind.as_str());
                }
            }
            info!("Audit worker stopped");
        });

        Self { tx }
    }

    /// Record a connection opening
    pub fn login(
        &self,
        connection_id: ConnectionId,
        source_addr: Option<String>,
        client_agent: Option<String>,
    ) {
        self.dispatch(AuditRecord {
            kind: AuditKind::Login,
            connection_id,
            username: None,
            details: json!({
                "ip": source_addr.clone(),
                "userAgent": client_agent.clone(),
            }),
            source_addr,
            client_agent,
            recorded_at: current_timestamp(),
        });
    }

    /// Record a connection closing
    pub fn logout(&self, connection_id: ConnectionId, username: Option<String>) {
        self.dispatch(AuditRecord {
            kind: AuditKind::Logout,
            connection_id,
            username: username.clone(),
            details: json!({ "username": username }),
            source_addr: None,
            client_agent: None,
            recorded_at: current_timestamp(),
        });
    }

    /// Record a public or session chat post
    pub fn chat(&self, connection_id: ConnectionId, username: Option<String>, message: &str) {
        self.dispatch(AuditRecord {
            kind: AuditKind::Chat,
            connection_id,
            username,
            details: json!({ "message": message }),
            source_addr: None,
            client_agent: None,
            recorded_at: current_timestamp(),
        });
    }

    fn dispatch(&self, record: AuditRecord) {
        // A closed worker only means we are shutting down; nothing to do
        let _ = self.tx.send(record);
    }
}
