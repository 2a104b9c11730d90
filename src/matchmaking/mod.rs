//! Matchmaking facade
//!
//! `MatchmakingManager` sequences the queue and game engines inside store
//! transactions and publishes the resulting events.

pub mod manager;

pub use manager::{MatchmakingManager, MatchmakingStats};
