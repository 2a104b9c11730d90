//! Queue management for the matchmaking service
//!
//! The registry owns queue creation and removal; membership tracks which
//! players wait in which queue.

pub mod membership;
pub mod registry;

pub use membership::{add_player, is_in_game, remove_player, target_queues};
pub use registry::{
    create_queue, list_queues, remove_queue, validate_queue_name, validate_queue_size,
    MIN_QUEUE_SIZE,
};
