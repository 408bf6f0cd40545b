//! Chat room instances and the room set
//!
//! A room's member list is an ordered sequence that permits duplicates: a
//! connection that joins twice appears twice. Broadcast targets are
//! deduplicated at send time instead.

use crate::types::{ChatMessage, ConnectionId, MatchId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A single tutoring chat room
#[derive(Debug, Clone)]
pub struct ChatRoom {
    pub match_id: MatchId,
    pub members: Vec<ConnectionId>,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl ChatRoom {
    pub fn new(match_id: MatchId, members: Vec<ConnectionId>, created_at: DateTime<Utc>) -> Self {
        Self {
            match_id,
            members,
            messages: Vec::new(),
            created_at,
        }
    }

    /// Distinct member connections, for fan-out
    pub fn broadcast_targets(&self) -> Vec<ConnectionId> {
        let mut targets = Vec::new();
        for member in &self.members {
            if !targets.contains(member) {
                targets.push(*member);
            }
        }
        targets
    }

    /// Whether the connection has posted at least one message in this room
    pub fn has_prior_message(&self, connection_id: ConnectionId) -> bool {
        self.messages.iter().any(|m| m.sender == connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// What happened on a join, so the caller can emit the right notifications
#[derive(Debug, Clone)]
pub struct JoinEffect {
    /// The room did not exist and was created lazily
    pub created: bool,
    /// Full history to replay to the joining connection, when owed one
    pub history_for_joiner: Option<Vec<ChatMessage>>,
}

/// All active rooms, keyed by match id
#[derive(Debug, Default)]
pub struct RoomSet {
    rooms: HashMap<MatchId, ChatRoom>,
}

impl RoomSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the room for a fresh pairing with both participants as members
    pub fn create_for_match(
        &mut self,
        match_id: MatchId,
        members: [ConnectionId; 2],
        now: DateTime<Utc>,
    ) {
        self.rooms.insert(
            match_id.clone(),
            ChatRoom::new(match_id, members.to_vec(), now),
        );
    }

    /// Join a room, creating it lazily when absent.
    ///
    /// Joining an existing room appends the connection even when it is
    /// already a member (duplicates permitted). History is replayed only to
    /// a joiner with at least one prior message in the room.
    pub fn join(
        &mut self,
        match_id: &str,
        connection_id: ConnectionId,
        now: DateTime<Utc>,
    ) -> JoinEffect {
        match self.rooms.get_mut(match_id) {
            None => {
                self.rooms.insert(
                    match_id.to_string(),
                    ChatRoom::new(match_id.to_string(), vec![connection_id], now),
                );
                JoinEffect {
                    created: true,
                    history_for_joiner: None,
                }
            }
            Some(room) => {
                let owed_history = room.has_prior_message(connection_id);
                room.members.push(connection_id);
                JoinEffect {
                    created: false,
                    history_for_joiner: owed_history.then(|| room.messages.clone()),
                }
            }
        }
    }

    /// Append a message to a room and return the fan-out targets.
    ///
    /// Returns `None` when the room does not exist; the caller drops the
    /// message silently (deliberate best-effort semantics).
    pub fn post(&mut self, match_id: &str, message: ChatMessage) -> Option<Vec<ConnectionId>> {
        let room = self.rooms.get_mut(match_id)?;
        room.messages.push(message);
        Some(room.broadcast_targets())
    }

    /// Remove every occurrence of the connection from every room, deleting
    /// rooms left empty. Returns the match ids of deleted rooms.
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Vec<MatchId> {
        let mut deleted = Vec::new();
        for (match_id, room) in self.rooms.iter_mut() {
            room.members.retain(|member| *member != connection_id);
            if room.is_empty() {
                deleted.push(match_id.clone());
            }
        }
        for match_id in &deleted {
            self.rooms.remove(match_id);
        }
        deleted
    }

    pub fn get(&self, match_id: &str) -> Option<&ChatRoom> {
        self.rooms.get(match_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
