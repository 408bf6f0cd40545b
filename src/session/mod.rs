//! Chat session (room) management
//!
//! Rooms are keyed by match id, created by a successful pairing or lazily by
//! an out-of-band join, and deleted the moment their last member leaves.

pub mod room;

pub use room::{ChatRoom, JoinEffect, RoomSet};
