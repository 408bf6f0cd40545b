//! Grade-bucketed waiting queues and candidate selection
//!
//! Each grade owns an insertion-ordered bucket of waiting participants. A
//! pairing request scans the requester's bucket for the oldest compatible
//! candidate; if none exists the requester is enqueued instead. All mutation
//! happens through `pair_or_enqueue`/`remove_connection`, which callers must
//! serialize (the hub holds its state lock across each call).

use crate::types::{ConnectionId, Grade, UserProfile, WaitingEntry};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// Result of a pairing attempt
#[derive(Debug, Clone)]
pub enum PairingOutcome {
    /// A compatible candidate was found and removed from its bucket.
    /// The requester was never inserted.
    Paired { partner: WaitingEntry },
    /// No compatible candidate; the requester now waits in its grade bucket
    Enqueued,
}

/// The three per-grade waiting pools
#[derive(Debug, Clone)]
pub struct GradeQueues {
    buckets: HashMap<Grade, VecDeque<WaitingEntry>>,
}

impl Default for GradeQueues {
    fn default() -> Self {
        Self::new()
    }
}

impl GradeQueues {
    pub fn new() -> Self {
        let mut buckets = HashMap::new();
        for grade in Grade::ALL {
            buckets.insert(grade, VecDeque::new());
        }
        Self { buckets }
    }

    /// Attempt to pair `connection_id` against its grade bucket.
    ///
    /// A candidate is compatible when its subject matches, its role differs,
    /// and it is not the requester itself. Among compatible candidates the
    /// one with the smallest `enqueued_at` wins; on an exact tie the
    /// candidate encountered first in insertion order is kept (strict
    /// less-than comparison, no re-sorting). Any stale entry the requester
    /// left in another bucket is removed first, so a connection never waits
    /// in two buckets at once.
    pub fn pair_or_enqueue(
        &mut self,
        connection_id: ConnectionId,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> PairingOutcome {
        self.remove_connection(connection_id);

        let bucket = self
            .buckets
            .get_mut(&profile.grade)
            .expect("all grade buckets exist");

        let mut best: Option<(usize, DateTime<Utc>)> = None;
        for (index, entry) in bucket.iter().enumerate() {
            if entry.connection_id == connection_id
                || entry.profile.subject != profile.subject
                || entry.profile.role == profile.role
            {
                continue;
            }
            match best {
                Some((_, oldest)) if entry.enqueued_at >= oldest => {}
                _ => best = Some((index, entry.enqueued_at)),
            }
        }

        match best {
            Some((index, _)) => {
                let partner = bucket.remove(index).expect("selected index is in bounds");
                PairingOutcome::Paired { partner }
            }
            None => {
                bucket.push_back(WaitingEntry {
                    connection_id,
                    profile: profile.clone(),
                    enqueued_at: now,
                });
                PairingOutcome::Enqueued
            }
        }
    }

    /// Remove the connection's waiting entry from the bucket of the given
    /// grade. Used by cancel requests, which know the stored profile's grade.
    pub fn cancel(&mut self, connection_id: ConnectionId, grade: Grade) -> Option<WaitingEntry> {
        let bucket = self.buckets.get_mut(&grade).expect("all grade buckets exist");
        let index = bucket
            .iter()
            .position(|entry| entry.connection_id == connection_id)?;
        bucket.remove(index)
    }

    /// Remove the connection's waiting entry from whichever bucket holds it,
    /// if any. Used by the disconnect cascade and the re-queue sweep.
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<WaitingEntry> {
        for bucket in self.buckets.values_mut() {
            if let Some(index) = bucket
                .iter()
                .position(|entry| entry.connection_id == connection_id)
            {
                return bucket.remove(index);
            }
        }
        None
    }

    /// Whether the connection currently waits in the given grade bucket
    pub fn contains(&self, connection_id: ConnectionId, grade: Grade) -> bool {
        self.buckets[&grade]
            .iter()
            .any(|entry| entry.connection_id == connection_id)
    }

    /// Number of waiting entries in one bucket
    pub fn bucket_len(&self, grade: Grade) -> usize {
        self.buckets[&grade].len()
    }

    /// Total number of waiting entries across all buckets
    pub fn waiting_count(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.len()).sum()
    }
}
