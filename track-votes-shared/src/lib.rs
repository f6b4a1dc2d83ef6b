//! # Track Votes Shared
//! This crate defines the data structures shared by the track voting service:
//! users and their vote sets, tracks and their counters, the vote commands and
//! receipts exchanged with the repository, and the leaderboard query contract.
pub mod types;

pub use types::*;
