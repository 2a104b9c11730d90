//! The matchmaking state tables
//!
//! `MatchmakingState` holds the five entity tables (players, queues, queue
//! memberships, games, game memberships) together with the filtering queries
//! the engines need. It knows nothing about rules; invariants are enforced by
//! the queue and game modules that mutate it inside a store transaction.

use crate::types::{
    Game, GameId, GameMembership, Player, PlayerId, Queue, QueueId, QueueMembership,
};
use crate::utils::current_timestamp;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MatchmakingState {
    players: HashMap<PlayerId, Player>,
    /// Creation order
    queues: Vec<Queue>,
    /// Insertion (join) order
    queue_memberships: Vec<QueueMembership>,
    /// Formation order
    games: Vec<Game>,
    game_memberships: Vec<GameMembership>,
}

impl MatchmakingState {
    pub fn new() -> Self {
        Self::default()
    }

    // Players

    /// Get the player record, creating it on first sight
    pub fn ensure_player(&mut self, player_id: &str) -> &Player {
        self.players
            .entry(player_id.to_string())
            .or_insert_with(|| Player {
                id: player_id.to_string(),
                first_seen_at: current_timestamp(),
            })
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    // Queues

    pub fn queues(&self) -> &[Queue] {
        &self.queues
    }

    pub fn queue(&self, queue_id: QueueId) -> Option<&Queue> {
        self.queues.iter().find(|q| q.id == queue_id)
    }

    pub fn queue_by_name(&self, name: &str) -> Option<&Queue> {
        self.queues.iter().find(|q| q.name == name)
    }

    pub fn insert_queue(&mut self, queue: Queue) {
        self.queues.push(queue);
    }

    /// Remove a queue together with its memberships
    pub fn remove_queue(&mut self, queue_id: QueueId) -> Option<Queue> {
        let position = self.queues.iter().position(|q| q.id == queue_id)?;
        self.queue_memberships.retain(|m| m.queue_id != queue_id);
        Some(self.queues.remove(position))
    }

    // Queue memberships

    pub fn queue_memberships(&self) -> &[QueueMembership] {
        &self.queue_memberships
    }

    pub fn has_membership(&self, queue_id: QueueId, player_id: &str) -> bool {
        self.queue_memberships
            .iter()
            .any(|m| m.queue_id == queue_id && m.player_id == player_id)
    }

    pub fn insert_membership(&mut self, membership: QueueMembership) {
        self.queue_memberships.push(membership);
    }

    pub fn remove_membership(&mut self, queue_id: QueueId, player_id: &str) -> bool {
        let before = self.queue_memberships.len();
        self.queue_memberships
            .retain(|m| !(m.queue_id == queue_id && m.player_id == player_id));
        before != self.queue_memberships.len()
    }

    /// Remove every membership a player holds, returning the affected queue ids
    pub fn remove_player_memberships(&mut self, player_id: &str) -> Vec<QueueId> {
        let mut removed = Vec::new();
        self.queue_memberships.retain(|m| {
            if m.player_id == player_id {
                removed.push(m.queue_id);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Memberships of a queue in join order
    pub fn memberships_for_queue(&self, queue_id: QueueId) -> Vec<&QueueMembership> {
        self.queue_memberships
            .iter()
            .filter(|m| m.queue_id == queue_id)
            .collect()
    }

    pub fn membership_count(&self, queue_id: QueueId) -> usize {
        self.queue_memberships
            .iter()
            .filter(|m| m.queue_id == queue_id)
            .count()
    }

    /// Take all memberships out of a queue
    pub fn clear_queue(&mut self, queue_id: QueueId) -> Vec<QueueMembership> {
        let (cleared, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.queue_memberships)
            .into_iter()
            .partition(|m| m.queue_id == queue_id);
        self.queue_memberships = kept;
        cleared
    }

    // Games

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn game(&self, game_id: GameId) -> Option<&Game> {
        self.games.iter().find(|g| g.id == game_id)
    }

    pub fn game_mut(&mut self, game_id: GameId) -> Option<&mut Game> {
        self.games.iter_mut().find(|g| g.id == game_id)
    }

    pub fn insert_game(&mut self, game: Game, memberships: Vec<GameMembership>) {
        self.games.push(game);
        self.game_memberships.extend(memberships);
    }

    pub fn game_memberships(&self) -> &[GameMembership] {
        &self.game_memberships
    }

    pub fn game_memberships_for(&self, game_id: GameId) -> Vec<&GameMembership> {
        self.game_memberships
            .iter()
            .filter(|m| m.game_id == game_id)
            .collect()
    }

    /// The unresolved game a player belongs to, with their membership in it
    pub fn unresolved_game_for(&self, player_id: &str) -> Option<(&Game, &GameMembership)> {
        self.game_memberships
            .iter()
            .filter(|m| m.player_id == player_id)
            .find_map(|m| {
                self.game(m.game_id)
                    .filter(|game| !game.is_resolved())
                    .map(|game| (game, m))
            })
    }

    pub fn unresolved_games(&self) -> impl Iterator<Item = &Game> {
        self.games.iter().filter(|g| !g.is_resolved())
    }
}
