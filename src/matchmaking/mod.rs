//! Matchmaking queue engine
//!
//! Per-grade waiting pools and the pairing algorithm that matches a
//! requester against the oldest compatible candidate.

pub mod queue;

pub use queue::{GradeQueues, PairingOutcome};
