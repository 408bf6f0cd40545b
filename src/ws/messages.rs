//! Wire protocol definitions for the WebSocket transport
//!
//! Frames are JSON objects shaped `{"event": <name>, "data": <payload>}` in
//! both directions, with camelCase payload fields (`matchId`, `partnerName`,
//! ...). Malformed or unrecognized inbound frames fail deserialization and
//! are logged and ignored by the handler.

use crate::types::{ChatMessage, ConnectionId, Grade, PublicMessage, Role};
use serde::{Deserialize, Serialize};

/// Profile payload of a `find_match` request
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub username: String,
    pub grade: Grade,
    pub subject: String,
    pub role: Role,
}

/// Events consumed from a client connection
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Reply with the current online set, to the caller only
    RequestOnlineUsers,
    /// Attach a profile and run the pairing algorithm
    FindMatch(MatchRequest),
    /// Leave the waiting queue
    CancelMatch,
    /// Post a raw message body to the public room
    PublicMessage(String),
    /// Reply with the full public history, to the caller only
    JoinPublicChat,
    /// Join (or lazily create) a paired chat room
    #[serde(rename_all = "camelCase")]
    JoinChat { match_id: String },
    /// Post a message into a paired chat room
    #[serde(rename_all = "camelCase")]
    ChatMessage { match_id: String, message: String },
}

/// Per-side payload of a `match_found` notification
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchNotice {
    pub match_id: String,
    pub wait_seconds: f64,
    pub partner_name: String,
    pub partner_role: Role,
}

/// Events emitted to client connections
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full online-id list, never a delta
    OnlineUsers(Vec<ConnectionId>),
    /// Unicast to each side of a successful pairing
    MatchFound(MatchNotice),
    /// Room broadcast announcing a joiner with a profile
    #[serde(rename_all = "camelCase")]
    ChatConnected {
        partner_id: ConnectionId,
        partner_name: String,
    },
    /// Unicast replay of a room's full history
    ChatHistory(Vec<ChatMessage>),
    /// Unicast snapshot of the public buffer, oldest first
    PublicChatHistory(Vec<PublicMessage>),
    /// Broadcast of a fresh public message
    NewPublicMessage(PublicMessage),
    /// Room broadcast of a fresh session message
    ChatMessage(ChatMessage),
}
