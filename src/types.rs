//! Common types used throughout the matchmaking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Stable external identifier of a player (e.g. a chat platform user id)
pub type PlayerId = String;

/// Unique identifier for queues
pub type QueueId = Uuid;

/// Unique identifier for games
pub type GameId = Uuid;

/// One of the two sides of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    /// Numeric team index (team 0 / team 1)
    pub fn index(self) -> u8 {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }

    /// The other team
    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::A => write!(f, "Team A"),
            Team::B => write!(f, "Team B"),
        }
    }
}

/// Resolved outcome of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "team", rename_all = "lowercase")]
pub enum GameResult {
    Winner(Team),
    Draw,
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::Winner(team) => write!(f, "{} won", team),
            GameResult::Draw => write!(f, "draw"),
        }
    }
}

/// Outcome reported by a participant, from their own team's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Translate a report made by a member of `team` into the game result
    pub fn result_for(self, team: Team) -> GameResult {
        match self {
            Outcome::Win => GameResult::Winner(team),
            Outcome::Loss => GameResult::Winner(team.opponent()),
            Outcome::Draw => GameResult::Draw,
        }
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "win" => Ok(Outcome::Win),
            "loss" => Ok(Outcome::Loss),
            "draw" => Ok(Outcome::Draw),
            other => Err(format!("unknown outcome '{}' (use win, loss or draw)", other)),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Loss => write!(f, "loss"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// Identity record for a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub first_seen_at: DateTime<Utc>,
}

/// A named queue with a fixed target size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub name: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

impl Queue {
    /// Number of players on each team of a game popped from this queue
    pub fn team_size(&self) -> usize {
        self.size / 2
    }
}

/// A player's pending slot in a queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMembership {
    pub queue_id: QueueId,
    pub player_id: PlayerId,
    pub joined_at: DateTime<Utc>,
}

/// A game assembled from one queue's full membership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub queue_id: QueueId,
    /// Name of the source queue at formation time
    pub queue_name: String,
    /// `None` while the game is unresolved
    pub result: Option<GameResult>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Game {
    pub fn is_resolved(&self) -> bool {
        self.result.is_some()
    }
}

/// A player's fixed team assignment within a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMembership {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub team: Team,
}

/// Event emitted when a player joins one or more queues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerQueued {
    pub player_id: PlayerId,
    pub queue_names: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when a full queue pops into a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFormed {
    pub game_id: GameId,
    pub queue_id: QueueId,
    pub queue_name: String,
    pub team_a: Vec<PlayerId>,
    pub team_b: Vec<PlayerId>,
    pub timestamp: DateTime<Utc>,
}

impl GameFormed {
    /// All players of the game, team A first
    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.team_a.iter().chain(self.team_b.iter())
    }
}

/// Event emitted when a game's result is recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFinished {
    pub game_id: GameId,
    pub queue_name: String,
    pub reported_by: PlayerId,
    pub outcome: Outcome,
    pub result: GameResult,
    pub timestamp: DateTime<Utc>,
}

/// Union type for all outbound matchmaking events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MatchmakingEvent {
    PlayerQueued(PlayerQueued),
    GameFormed(GameFormed),
    GameFinished(GameFinished),
}

/// Result of an add request: queues actually joined and games that popped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddResult {
    pub joined: Vec<String>,
    pub games: Vec<GameFormed>,
}

impl AddResult {
    pub fn is_noop(&self) -> bool {
        self.joined.is_empty() && self.games.is_empty()
    }
}

/// Status line for a single queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub name: String,
    pub size: usize,
    /// Members in join order
    pub players: Vec<PlayerId>,
    pub remaining: usize,
}

/// An unresolved game with its rosters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveGame {
    pub game_id: GameId,
    pub queue_name: String,
    pub team_a: Vec<PlayerId>,
    pub team_b: Vec<PlayerId>,
    pub created_at: DateTime<Utc>,
}

/// Read-only snapshot used to render "status"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchmakingStatus {
    pub queues: Vec<QueueStatus>,
    pub active_games: Vec<ActiveGame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_translation() {
        assert_eq!(Outcome::Win.result_for(Team::A), GameResult::Winner(Team::A));
        assert_eq!(Outcome::Loss.result_for(Team::A), GameResult::Winner(Team::B));
        assert_eq!(Outcome::Loss.result_for(Team::B), GameResult::Winner(Team::A));
        assert_eq!(Outcome::Draw.result_for(Team::B), GameResult::Draw);
    }

    #[test]
    fn test_outcome_parsing() {
        assert_eq!("WIN".parse::<Outcome>(), Ok(Outcome::Win));
        assert_eq!("loss".parse::<Outcome>(), Ok(Outcome::Loss));
        assert_eq!("Draw".parse::<Outcome>(), Ok(Outcome::Draw));
        assert!("forfeit".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_team_index() {
        assert_eq!(Team::A.index(), 0);
        assert_eq!(Team::B.index(), 1);
        assert_eq!(Team::A.opponent(), Team::B);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = MatchmakingEvent::PlayerQueued(PlayerQueued {
            player_id: "stork".to_string(),
            queue_names: vec!["LTpug".to_string()],
            timestamp: Utc::now(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PlayerQueued");
        assert_eq!(json["queue_names"][0], "LTpug");
    }
}
