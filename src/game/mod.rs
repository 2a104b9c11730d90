//! Game lifecycle: formation from full queues and resolution of results

pub mod formation;
pub mod resolution;

pub use formation::{
    form_full_queues, form_game, JoinOrderPartitioner, RandomPartitioner, TeamPartitionPolicy,
    TeamPartitioner,
};
pub use resolution::finish_game;
