//! Pug Room - pickup-game matchmaking service
//!
//! Players join named queues of fixed even size. When a queue is exactly
//! full it pops into a game of two equal teams, and a participant later
//! reports the result. This crate provides the transactional state store,
//! the queue and game engines, the matchmaking facade, a chat command layer
//! and the service plumbing around them.

pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod matchmaking;
pub mod metrics;
pub mod queue;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use commands::{Command, CommandDispatcher};
pub use events::{BroadcastEventPublisher, EventPublisher, NoopEventPublisher};
pub use game::{TeamPartitionPolicy, TeamPartitioner};
pub use matchmaking::{MatchmakingManager, MatchmakingStats};
pub use store::{InMemoryMatchmakingStore, MatchmakingState, MatchmakingStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
