//! Tutor Match - Anonymous one-on-one tutoring matchmaking service
//!
//! This crate pairs waiting students and tutors by grade, subject, and
//! role over long-lived WebSocket connections, and relays their private
//! and public chat traffic.

pub mod audit;
pub mod config;
pub mod error;
pub mod hub;
pub mod matchmaking;
pub mod public_chat;
pub mod registry;
pub mod session;
pub mod types;
pub mod utils;
pub mod ws;

// Re-export commonly used types and traits
pub use error::{Result, TutorMatchError};
pub use types::*;

// Re-export key components
pub use audit::{AuditLogger, AuditStore, SqliteAuditStore};
pub use hub::{Hub, HubStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
