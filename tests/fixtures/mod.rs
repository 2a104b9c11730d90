//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use pug_room::error::Result;
use pug_room::events::EventPublisher;
use pug_room::game::{JoinOrderPartitioner, TeamPartitioner};
use pug_room::matchmaking::MatchmakingManager;
use pug_room::metrics::MetricsCollector;
use pug_room::store::InMemoryMatchmakingStore;
use pug_room::types::{GameFinished, GameFormed, MatchmakingEvent, PlayerQueued};
use std::sync::{Arc, Mutex};

/// Mock event publisher that captures published events for testing
#[derive(Debug, Default)]
pub struct MockEventPublisher {
    published_events: Arc<Mutex<Vec<MatchmakingEvent>>>,
    fail: bool,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher that records nothing and fails every publish
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Get all published events (for testing)
    pub fn get_published_events(&self) -> Vec<MatchmakingEvent> {
        self.published_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Count events of specific type
    pub fn count_events_of_type(&self, event_type: &str) -> usize {
        self.get_published_events()
            .iter()
            .filter(|event| match event {
                MatchmakingEvent::PlayerQueued(_) => event_type == "PlayerQueued",
                MatchmakingEvent::GameFormed(_) => event_type == "GameFormed",
                MatchmakingEvent::GameFinished(_) => event_type == "GameFinished",
            })
            .count()
    }

    /// All GameFormed events in publish order
    pub fn games_formed(&self) -> Vec<GameFormed> {
        self.get_published_events()
            .into_iter()
            .filter_map(|event| match event {
                MatchmakingEvent::GameFormed(game) => Some(game),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: MatchmakingEvent) -> Result<()> {
        if self.fail {
            anyhow::bail!("publisher unavailable");
        }
        if let Ok(mut events) = self.published_events.lock() {
            events.push(event);
        }
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish_player_queued(&self, event: PlayerQueued) -> Result<()> {
        self.record(MatchmakingEvent::PlayerQueued(event))
    }

    async fn publish_game_formed(&self, event: GameFormed) -> Result<()> {
        self.record(MatchmakingEvent::GameFormed(event))
    }

    async fn publish_game_finished(&self, event: GameFinished) -> Result<()> {
        self.record(MatchmakingEvent::GameFinished(event))
    }
}

/// Manager with deterministic (join order) teams and a recording publisher
pub fn create_test_system() -> (MatchmakingManager, Arc<MockEventPublisher>) {
    create_test_system_with(Arc::new(JoinOrderPartitioner))
}

pub fn create_test_system_with(
    partitioner: Arc<dyn TeamPartitioner>,
) -> (MatchmakingManager, Arc<MockEventPublisher>) {
    let event_publisher = Arc::new(MockEventPublisher::new());
    let manager = MatchmakingManager::with_components(
        Arc::new(InMemoryMatchmakingStore::new()),
        partitioner,
        event_publisher.clone(),
        Arc::new(MetricsCollector::new().expect("Failed to create metrics collector")),
    );
    (manager, event_publisher)
}

/// Player names used throughout the tests
pub const PLAYERS: [&str; 4] = ["opsayo", "stork", "izza", "lyon"];

/// Generate `count` distinct player ids
pub fn player_ids(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}_{}", prefix, i)).collect()
}
