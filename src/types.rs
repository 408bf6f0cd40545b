//! Common types used throughout the tutoring matchmaking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a live connection
pub type ConnectionId = Uuid;

/// Unique identifier for a successful pairing and the chat room it spawns
pub type MatchId = String;

/// Username shown when a sender never attached a profile
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Grade bucket a participant queues in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    M4,
    M5,
    M6,
}

impl Grade {
    /// All recognized grade buckets, in a fixed order
    pub const ALL: [Grade; 3] = [Grade::M4, Grade::M5, Grade::M6];
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::M4 => write!(f, "m4"),
            Grade::M5 => write!(f, "m5"),
            Grade::M6 => write!(f, "m6"),
        }
    }
}

/// Which side of a tutoring session a participant wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Tutor => write!(f, "tutor"),
        }
    }
}

/// Profile attached to a connection when it issues a match request.
/// Never persisted; dies with the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub grade: Grade,
    pub subject: String,
    pub role: Role,
}

/// One waiting participant inside a grade bucket
#[derive(Debug, Clone)]
pub struct WaitingEntry {
    pub connection_id: ConnectionId,
    pub profile: UserProfile,
    pub enqueued_at: DateTime<Utc>,
}

/// Message appended to exactly one chat room, immutable once appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: ConnectionId,
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Message in the process-wide public feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicMessage {
    pub id: ConnectionId,
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Kind of activity record handed to the audit collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    Login,
    Logout,
    Chat,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Login => "login",
            AuditKind::Logout => "logout",
            AuditKind::Chat => "chat",
        }
    }
}

/// Fire-and-forget activity record for durable audit storage
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub kind: AuditKind,
    pub connection_id: ConnectionId,
    pub username: Option<String>,
    pub details: serde_json::Value,
    pub source_addr: Option<String>,
    pub client_agent: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_wire_values() {
        assert_eq!(serde_json::to_string(&Grade::M4).unwrap(), "\"m4\"");
        assert_eq!(
            serde_json::from_str::<Grade>("\"m6\"").unwrap(),
            Grade::M6
        );
        // Unrecognized buckets are unrepresentable
        assert!(serde_json::from_str::<Grade>("\"m7\"").is_err());
    }

    #[test]
    fn test_role_wire_values() {
        assert_eq!(serde_json::to_string(&Role::Tutor).unwrap(), "\"tutor\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"student\"").unwrap(),
            Role::Student
        );
    }

    #[test]
    fn test_audit_kind_labels() {
        assert_eq!(AuditKind::Login.as_str(), "login");
        assert_eq!(AuditKind::Logout.as_str(), "logout");
        assert_eq!(AuditKind::Chat.as_str(), "chat");
    }
}
