//! Event publishing for committed matchmaking facts

use crate::error::Result;
use crate::types::{GameFinished, GameFormed, MatchmakingEvent, PlayerQueued};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

/// Default capacity of the broadcast channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Trait for publishing matchmaking events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a PlayerQueued event
    async fn publish_player_queued(&self, event: PlayerQueued) -> Result<()>;

    /// Publish a GameFormed event
    async fn publish_game_formed(&self, event: GameFormed) -> Result<()>;

    /// Publish a GameFinished event
    async fn publish_game_finished(&self, event: GameFinished) -> Result<()>;
}

/// Fans events out to in-process subscribers (chat transports, loggers)
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<MatchmakingEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<MatchmakingEvent> {
        self.sender.subscribe()
    }

    fn send(&self, event: MatchmakingEvent) -> Result<()> {
        // No subscribers is not a failure.
        if let Err(e) = self.sender.send(event) {
            debug!("No subscribers for event: {:?}", e.0);
        }
        Ok(())
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish_player_queued(&self, event: PlayerQueued) -> Result<()> {
        self.send(MatchmakingEvent::PlayerQueued(event))
    }

    async fn publish_game_formed(&self, event: GameFormed) -> Result<()> {
        self.send(MatchmakingEvent::GameFormed(event))
    }

    async fn publish_game_finished(&self, event: GameFinished) -> Result<()> {
        self.send(MatchmakingEvent::GameFinished(event))
    }
}

/// Publisher that drops every event
#[derive(Debug, Clone, Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish_player_queued(&self, _event: PlayerQueued) -> Result<()> {
        Ok(())
    }

    async fn publish_game_formed(&self, _event: GameFormed) -> Result<()> {
        Ok(())
    }

    async fn publish_game_finished(&self, _event: GameFinished) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::current_timestamp;

    fn queued(player_id: &str) -> PlayerQueued {
        PlayerQueued {
            player_id: player_id.to_string(),
            queue_names: vec!["LTpug".to_string()],
            timestamp: current_timestamp(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let publisher = BroadcastEventPublisher::default();
        let mut receiver = publisher.subscribe();

        publisher.publish_player_queued(queued("opsayo")).await.unwrap();

        match receiver.recv().await.unwrap() {
            MatchmakingEvent::PlayerQueued(event) => assert_eq!(event.player_id, "opsayo"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let publisher = BroadcastEventPublisher::new(4);
        assert!(publisher.publish_player_queued(queued("stork")).await.is_ok());
    }
}
