//! Matchmaking manager: the single entry point into the core
//!
//! Every public operation runs as one store transaction. Membership changes
//! and any games they complete commit together; events are published only
//! after the commit succeeded.

use crate::error::{MatchmakingError, Result};
use crate::events::EventPublisher;
use crate::game::{self, TeamPartitioner};
use crate::metrics::MetricsCollector;
use crate::queue;
use crate::store::{MatchmakingStore, MatchmakingStoreExt};
use crate::types::{
    ActiveGame, AddResult, Game, GameFinished, GameId, MatchmakingStatus, Outcome, PlayerQueued,
    Queue, QueueStatus, Team,
};
use crate::utils::{current_timestamp, short_id};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Statistics about matchmaking operations
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchmakingStats {
    /// Total number of queues created
    pub queues_created: u64,
    /// Total number of queues removed
    pub queues_removed: u64,
    /// Total number of queue memberships added
    pub players_queued: u64,
    /// Total number of games formed
    pub games_formed: u64,
    /// Total number of games resolved
    pub games_finished: u64,
    /// Current number of queues
    pub active_queues: usize,
    /// Current number of queue memberships
    pub players_waiting: usize,
    /// Current number of unresolved games
    pub active_games: usize,
}

/// The matchmaking manager
#[derive(Clone)]
pub struct MatchmakingManager {
    /// Transactional state store
    store: Arc<dyn MatchmakingStore>,
    /// Team partition policy applied when a queue pops
    partitioner: Arc<dyn TeamPartitioner>,
    /// Event publisher for committed facts
    event_publisher: Arc<dyn EventPublisher>,
    /// Manager statistics
    stats: Arc<RwLock<MatchmakingStats>>,
    /// Metrics collector for recording performance data
    metrics_collector: Arc<MetricsCollector>,
}

impl MatchmakingManager {
    /// Create a manager from explicit components
    pub fn with_components(
        store: Arc<dyn MatchmakingStore>,
        partitioner: Arc<dyn TeamPartitioner>,
        event_publisher: Arc<dyn EventPublisher>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        info!(
            "Matchmaking manager created with '{}' team partitioning",
            partitioner.name()
        );

        Self {
            store,
            partitioner,
            event_publisher,
            stats: Arc::new(RwLock::new(MatchmakingStats::default())),
            metrics_collector,
        }
    }

    /// Register a new queue
    pub async fn create_queue(&self, name: &str, size: usize) -> Result<Queue> {
        let start_time = Instant::now();

        let result = self
            .store
            .transaction(|state| queue::create_queue(state, name, size));
        self.metrics_collector
            .record_operation("create_queue", result.is_ok(), start_time.elapsed());

        let queue = result?;
        self.update_stats(|stats| stats.queues_created += 1);
        self.metrics_collector.record_queue_created();

        info!(
            "Created queue '{}' (size {}, id {})",
            queue.name,
            queue.size,
            short_id(&queue.id)
        );
        Ok(queue)
    }

    /// Remove a queue by name, returning whether it existed
    ///
    /// Pending memberships of the queue are dropped; games formed from it
    /// remain and can still be resolved.
    pub async fn remove_queue(&self, name: &str) -> Result<bool> {
        let start_time = Instant::now();

        let result = self
            .store
            .transaction(|state| Ok(queue::remove_queue(state, name)));
        self.metrics_collector
            .record_operation("remove_queue", result.is_ok(), start_time.elapsed());

        match result? {
            Some(removed) => {
                self.update_stats(|stats| stats.queues_removed += 1);
                self.metrics_collector.record_queue_removed();
                info!("Removed queue '{}'", removed.name);
                Ok(true)
            }
            None => {
                debug!("Ignoring removal of unknown queue '{}'", name);
                Ok(false)
            }
        }
    }

    /// All queues in creation order
    pub async fn list_queues(&self) -> Result<Vec<Queue>> {
        self.store.query(queue::list_queues)
    }

    /// Queue a player into one queue (`Some(name)`) or every queue (`None`)
    ///
    /// Any queue the join makes exactly full pops into a game in the same
    /// transaction.
    pub async fn add_player(&self, player_id: &str, queue_name: Option<&str>) -> Result<AddResult> {
        let start_time = Instant::now();
        let partitioner = self.partitioner.clone();

        let result = self.store.transaction(|state| {
            state.ensure_player(player_id);

            let joined = queue::add_player(state, player_id, queue_name);
            let candidates: Vec<_> = joined.iter().map(|q| q.id).collect();
            let games = game::form_full_queues(state, &candidates, partitioner.as_ref())?;

            Ok(AddResult {
                joined: joined.into_iter().map(|q| q.name).collect(),
                games,
            })
        });
        self.metrics_collector
            .record_operation("add_player", result.is_ok(), start_time.elapsed());

        let added = result?;
        if added.is_noop() {
            debug!(
                "Add request from '{}' for {:?} changed nothing",
                player_id, queue_name
            );
            return Ok(added);
        }

        self.update_stats(|stats| {
            stats.players_queued += added.joined.len() as u64;
            stats.games_formed += added.games.len() as u64;
        });
        for name in &added.joined {
            self.metrics_collector.record_queue_join(name);
        }

        info!("Player '{}' joined {:?}", player_id, added.joined);

        if !added.joined.is_empty() {
            let event = PlayerQueued {
                player_id: player_id.to_string(),
                queue_names: added.joined.clone(),
                timestamp: current_timestamp(),
            };
            if let Err(e) = self.event_publisher.publish_player_queued(event).await {
                warn!("Failed to publish PlayerQueued for '{}': {}", player_id, e);
            }
        }

        for formed in &added.games {
            self.metrics_collector.record_game_formed(&formed.queue_name);
            info!(
                "Queue '{}' popped into game {} - {}: {:?}, {}: {:?}",
                formed.queue_name,
                short_id(&formed.game_id),
                Team::A,
                formed.team_a,
                Team::B,
                formed.team_b
            );

            if let Err(e) = self.event_publisher.publish_game_formed(formed.clone()).await {
                warn!(
                    "Failed to publish GameFormed for game {}: {}",
                    formed.game_id, e
                );
            }
        }

        Ok(added)
    }

    /// Remove a player from one queue or every queue, returning the names left
    pub async fn remove_player(&self, player_id: &str, queue_name: Option<&str>) -> Result<Vec<String>> {
        let start_time = Instant::now();

        let result = self
            .store
            .transaction(|state| Ok(queue::remove_player(state, player_id, queue_name)));
        self.metrics_collector
            .record_operation("remove_player", result.is_ok(), start_time.elapsed());

        let left = result?;
        if left.is_empty() {
            debug!("Player '{}' was not queued in {:?}", player_id, queue_name);
        } else {
            info!("Player '{}' left {:?}", player_id, left);
        }
        Ok(left)
    }

    /// Whether the player is in an unresolved game
    pub async fn is_in_game(&self, player_id: &str) -> Result<bool> {
        self.store
            .query(|state| queue::is_in_game(state, player_id))
    }

    /// Record a reported outcome for the player's active game
    ///
    /// Returns `None` when the player has no unresolved game.
    pub async fn finish_game(
        &self,
        player_id: &str,
        outcome: Outcome,
    ) -> Result<Option<GameFinished>> {
        let start_time = Instant::now();

        let result = self.store.transaction(|state| {
            let finished = game::finish_game(state, player_id, outcome);
            let created_at = finished
                .as_ref()
                .and_then(|f| state.game(f.game_id))
                .map(|g| g.created_at);
            Ok(finished.zip(created_at))
        });
        self.metrics_collector
            .record_operation("finish_game", result.is_ok(), start_time.elapsed());

        let (finished, created_at) = match result? {
            Some(resolved) => resolved,
            None => {
                debug!(
                    "Ignoring {} report from '{}': not in an active game",
                    outcome, player_id
                );
                return Ok(None);
            }
        };

        self.update_stats(|stats| stats.games_finished += 1);
        let duration = (finished.timestamp - created_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        self.metrics_collector
            .record_game_finished(finished.result, duration);

        info!(
            "Game {} from '{}' finished: {} (reported {} by '{}')",
            short_id(&finished.game_id),
            finished.queue_name,
            finished.result,
            finished.outcome,
            finished.reported_by
        );

        if let Err(e) = self
            .event_publisher
            .publish_game_finished(finished.clone())
            .await
        {
            warn!(
                "Failed to publish GameFinished for game {}: {}",
                finished.game_id, e
            );
        }

        Ok(Some(finished))
    }

    /// Snapshot of every queue and every unresolved game
    pub async fn status(&self) -> Result<MatchmakingStatus> {
        self.store.query(|state| {
            let queues = state
                .queues()
                .iter()
                .map(|q| {
                    let players: Vec<_> = state
                        .memberships_for_queue(q.id)
                        .into_iter()
                        .map(|m| m.player_id.clone())
                        .collect();
                    QueueStatus {
                        name: q.name.clone(),
                        size: q.size,
                        remaining: q.size.saturating_sub(players.len()),
                        players,
                    }
                })
                .collect();

            let active_games = state
                .unresolved_games()
                .map(|g| active_game(state, g))
                .collect();

            MatchmakingStatus {
                queues,
                active_games,
            }
        })
    }

    /// Look up a game by id
    pub async fn get_game(&self, game_id: GameId) -> Result<Option<Game>> {
        self.store.query(|state| state.game(game_id).cloned())
    }

    /// The unresolved game a player belongs to, with rosters
    pub async fn active_game_for(&self, player_id: &str) -> Result<Option<ActiveGame>> {
        self.store.query(|state| {
            state
                .unresolved_game_for(player_id)
                .map(|(game, _)| active_game(state, game))
        })
    }

    /// Get current manager statistics
    pub async fn get_stats(&self) -> Result<MatchmakingStats> {
        let (active_queues, players_waiting, active_games) = self.store.query(|state| {
            (
                state.queues().len(),
                state.queue_memberships().len(),
                state.unresolved_games().count(),
            )
        })?;

        let mut stats = self
            .stats
            .write()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
        stats.active_queues = active_queues;
        stats.players_waiting = players_waiting;
        stats.active_games = active_games;

        Ok(stats.clone())
    }

    /// Name of the team partition policy in use
    pub fn partition_policy(&self) -> &'static str {
        self.partitioner.name()
    }

    /// Apply a counter update after a commit
    ///
    /// The operation has already committed, so a poisoned stats lock is
    /// logged and skipped rather than reported to the caller.
    fn update_stats(&self, update: impl FnOnce(&mut MatchmakingStats)) {
        match self.stats.write() {
            Ok(mut stats) => update(&mut stats),
            Err(_) => warn!("Stats lock poisoned, skipping counter update"),
        }
    }
}

fn active_game(state: &crate::store::MatchmakingState, game: &Game) -> ActiveGame {
    let mut team_a = Vec::new();
    let mut team_b = Vec::new();
    for membership in state.game_memberships_for(game.id) {
        match membership.team {
            Team::A => team_a.push(membership.player_id.clone()),
            Team::B => team_b.push(membership.player_id.clone()),
        }
    }

    ActiveGame {
        game_id: game.id,
        queue_name: game.queue_name.clone(),
        team_a,
        team_b,
        created_at: game.created_at,
    }
}
