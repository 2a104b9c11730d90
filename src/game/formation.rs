//! Game formation: turning a full queue into a game
//!
//! Formation runs inside the same store transaction as the add that filled
//! the queue, so no reader ever sees a full queue or a half-built game.

use crate::error::{MatchmakingError, Result};
use crate::store::MatchmakingState;
use crate::types::{Game, GameFormed, GameMembership, PlayerId, QueueId, Team};
use crate::utils::{current_timestamp, generate_game_id};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Policy deciding which team each player of a popped queue lands on
#[cfg_attr(test, mockall::automock)]
pub trait TeamPartitioner: Send + Sync {
    /// Return one team per player, in the order given (join order)
    fn assign_teams(&self, players: &[PlayerId]) -> Vec<Team>;

    /// Policy name for logging
    fn name(&self) -> &'static str;
}

/// Random split into two equal halves
#[derive(Debug, Clone, Default)]
pub struct RandomPartitioner;

impl TeamPartitioner for RandomPartitioner {
    fn assign_teams(&self, players: &[PlayerId]) -> Vec<Team> {
        let mut order: Vec<usize> = (0..players.len()).collect();
        order.shuffle(&mut rand::thread_rng());

        let half = players.len() / 2;
        let mut teams = vec![Team::B; players.len()];
        for &index in order.iter().take(half) {
            teams[index] = Team::A;
        }
        teams
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Alternate teams by join order: 1st to A, 2nd to B, 3rd to A, ...
#[derive(Debug, Clone, Default)]
pub struct JoinOrderPartitioner;

impl TeamPartitioner for JoinOrderPartitioner {
    fn assign_teams(&self, players: &[PlayerId]) -> Vec<Team> {
        (0..players.len())
            .map(|i| if i % 2 == 0 { Team::A } else { Team::B })
            .collect()
    }

    fn name(&self) -> &'static str {
        "join_order"
    }
}

/// Configurable choice of partition policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamPartitionPolicy {
    #[default]
    Random,
    JoinOrder,
}

impl TeamPartitionPolicy {
    /// Build the partitioner for this policy
    pub fn partitioner(self) -> Arc<dyn TeamPartitioner> {
        match self {
            TeamPartitionPolicy::Random => Arc::new(RandomPartitioner),
            TeamPartitionPolicy::JoinOrder => Arc::new(JoinOrderPartitioner),
        }
    }
}

impl FromStr for TeamPartitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(TeamPartitionPolicy::Random),
            "join_order" | "join-order" => Ok(TeamPartitionPolicy::JoinOrder),
            other => Err(format!("unknown team partition policy '{}'", other)),
        }
    }
}

/// Form games for every candidate queue that is exactly full
///
/// Candidates are processed in order and fullness is re-checked right before
/// each formation: a game pulls its players out of every other queue, so a
/// queue that was full a moment ago may no longer be.
pub fn form_full_queues(
    state: &mut MatchmakingState,
    candidates: &[QueueId],
    partitioner: &dyn TeamPartitioner,
) -> Result<Vec<GameFormed>> {
    let mut formed = Vec::new();

    for &queue_id in candidates {
        let is_full = state
            .queue(queue_id)
            .map(|queue| state.membership_count(queue_id) == queue.size)
            .unwrap_or(false);

        if is_full {
            formed.push(form_game(state, queue_id, partitioner)?);
        }
    }

    Ok(formed)
}

/// Pop a full queue into a new game
pub fn form_game(
    state: &mut MatchmakingState,
    queue_id: QueueId,
    partitioner: &dyn TeamPartitioner,
) -> Result<GameFormed> {
    let queue = state
        .queue(queue_id)
        .cloned()
        .ok_or_else(|| MatchmakingError::InternalError {
            message: format!("Cannot form game: queue {} does not exist", queue_id),
        })?;

    let member_count = state.membership_count(queue_id);
    if member_count != queue.size {
        return Err(MatchmakingError::InternalError {
            message: format!(
                "Cannot form game from queue '{}': {}/{} players",
                queue.name, member_count, queue.size
            ),
        }
        .into());
    }

    let players: Vec<PlayerId> = state
        .clear_queue(queue_id)
        .into_iter()
        .map(|m| m.player_id)
        .collect();

    let teams = partitioner.assign_teams(&players);
    validate_assignment(&queue.name, queue.team_size(), &players, &teams)?;

    let game_id = generate_game_id();
    let timestamp = current_timestamp();
    let memberships: Vec<GameMembership> = players
        .iter()
        .zip(teams.iter())
        .map(|(player_id, &team)| GameMembership {
            game_id,
            player_id: player_id.clone(),
            team,
        })
        .collect();

    let team_a: Vec<PlayerId> = memberships
        .iter()
        .filter(|m| m.team == Team::A)
        .map(|m| m.player_id.clone())
        .collect();
    let team_b: Vec<PlayerId> = memberships
        .iter()
        .filter(|m| m.team == Team::B)
        .map(|m| m.player_id.clone())
        .collect();

    state.insert_game(
        Game {
            id: game_id,
            queue_id,
            queue_name: queue.name.clone(),
            result: None,
            created_at: timestamp,
            finished_at: None,
        },
        memberships,
    );

    // In-game players may not wait in any other queue.
    for player_id in &players {
        let swept = state.remove_player_memberships(player_id);
        if !swept.is_empty() {
            debug!(
                "Removed player '{}' from {} other queue(s) after game {} formed",
                player_id,
                swept.len(),
                game_id
            );
        }
    }

    info!(
        "Formed game {} from queue '{}' ({} policy) - team A: {:?}, team B: {:?}",
        game_id,
        queue.name,
        partitioner.name(),
        team_a,
        team_b
    );

    Ok(GameFormed {
        game_id,
        queue_id,
        queue_name: queue.name,
        team_a,
        team_b,
        timestamp,
    })
}

fn validate_assignment(
    queue_name: &str,
    team_size: usize,
    players: &[PlayerId],
    teams: &[Team],
) -> Result<()> {
    if teams.len() != players.len() {
        return Err(MatchmakingError::InternalError {
            message: format!(
                "Team assignment for queue '{}' covers {} of {} players",
                queue_name,
                teams.len(),
                players.len()
            ),
        }
        .into());
    }

    let team_a = teams.iter().filter(|&&t| t == Team::A).count();
    if team_a != team_size || teams.len() - team_a != team_size {
        return Err(MatchmakingError::InternalError {
            message: format!(
                "Unbalanced team assignment for queue '{}': {} vs {}",
                queue_name,
                team_a,
                teams.len() - team_a
            ),
        }
        .into());
    }

    Ok(())
}
