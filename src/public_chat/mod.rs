//! Public broadcast channel
//!
//! A single process-wide bounded message history shared by every
//! connection, independent of matchmaking. Capacity 100, oldest evicted
//! first (FIFO, not LRU).

use crate::types::PublicMessage;
use std::collections::VecDeque;

/// Maximum number of retained public messages
pub const PUBLIC_FEED_CAPACITY: usize = 100;

/// The shared public message ring buffer
#[derive(Debug)]
pub struct PublicFeed {
    messages: VecDeque<PublicMessage>,
    capacity: usize,
}

impl Default for PublicFeed {
    fn default() -> Self {
        Self::with_capacity(PUBLIC_FEED_CAPACITY)
    }
}

impl PublicFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting the oldest entry once over capacity
    pub fn push(&mut self, message: PublicMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Snapshot of the current buffer, oldest first
    pub fn history(&self) -> Vec<PublicMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
