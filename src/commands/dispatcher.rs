//! Command dispatch: admin checks, manager calls and replies

use crate::commands::admin::AdminRegistry;
use crate::commands::parser::Command;
use crate::commands::render::{render_game_formed, render_help, render_status};
use crate::error::{MatchmakingError, Result};
use crate::matchmaking::MatchmakingManager;
use crate::metrics::MetricsCollector;
use crate::utils::short_id;
use rand::Rng;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Turns chat messages into matchmaking operations
pub struct CommandDispatcher {
    manager: Arc<MatchmakingManager>,
    admins: AdminRegistry,
    prefix: RwLock<String>,
    metrics_collector: Arc<MetricsCollector>,
}

impl CommandDispatcher {
    pub fn new(
        manager: Arc<MatchmakingManager>,
        admins: AdminRegistry,
        prefix: impl Into<String>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            manager,
            admins,
            prefix: RwLock::new(prefix.into()),
            metrics_collector,
        }
    }

    /// Current command prefix
    pub fn prefix(&self) -> Result<String> {
        let prefix = self
            .prefix
            .read()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire prefix lock".to_string(),
            })?;
        Ok(prefix.clone())
    }

    pub fn admins(&self) -> &AdminRegistry {
        &self.admins
    }

    /// Handle one message from `author`
    ///
    /// Returns the reply to post, or `None` when the message is not a
    /// command. Rejected requests are replies; only service faults are
    /// returned as errors.
    pub async fn handle_message(&self, author: &str, content: &str) -> Result<Option<String>> {
        let prefix = self.prefix()?;

        let command = match Command::parse(&prefix, content) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(None),
            Err(e) => {
                debug!("Rejected command from '{}': {}", author, e);
                return Ok(Some(e.to_string()));
            }
        };

        debug!("Handling {:?} from '{}'", command, author);

        if command.requires_admin() && !self.admins.is_admin(author)? {
            warn!(
                "Refused admin command '{}' from non-admin '{}'",
                command.name(),
                author
            );
            self.metrics_collector.record_command(command.name(), false);
            return Ok(Some(format!(
                "{}: you must be an admin to use {}{}",
                author,
                prefix,
                command.name()
            )));
        }

        let name = command.name();
        match self.execute(author, &prefix, command).await {
            Ok(reply) => {
                self.metrics_collector.record_command(name, true);
                Ok(Some(reply))
            }
            Err(e) => {
                self.metrics_collector.record_command(name, false);
                match e.downcast_ref::<MatchmakingError>() {
                    Some(domain) if domain.is_validation() => Ok(Some(domain.to_string())),
                    _ => Err(e),
                }
            }
        }
    }

    async fn execute(&self, author: &str, prefix: &str, command: Command) -> Result<String> {
        let reply = match command {
            Command::Add { queue } => {
                let added = self.manager.add_player(author, queue.as_deref()).await?;
                if added.is_noop() {
                    if self.manager.is_in_game(author).await? {
                        format!(
                            "{}: you are in an active game, report it with {}finishgame first",
                            author, prefix
                        )
                    } else {
                        let queues = self.manager.list_queues().await?;
                        match queue.as_deref() {
                            Some(name) if !queues.iter().any(|q| q.name == name) => {
                                format!("No queue named {}", name)
                            }
                            _ if queues.is_empty() => format!("{}: no queues to join", author),
                            Some(name) => format!("{}: you are already queued in {}", author, name),
                            None => format!("{}: you are already queued", author),
                        }
                    }
                } else {
                    let mut lines = Vec::new();
                    if !added.joined.is_empty() {
                        lines.push(format!("{} joined {}", author, added.joined.join(", ")));
                    }
                    lines.extend(added.games.iter().map(render_game_formed));
                    lines.join("\n")
                }
            }
            Command::Del { queue } => {
                let left = self.manager.remove_player(author, queue.as_deref()).await?;
                if left.is_empty() {
                    format!("{}: you are not queued", author)
                } else {
                    format!("{} left {}", author, left.join(", "))
                }
            }
            Command::Status => render_status(&self.manager.status().await?),
            Command::FinishGame { outcome } => {
                match self.manager.finish_game(author, outcome).await? {
                    Some(finished) => format!(
                        "Game {} ({}) finished: {}",
                        short_id(&finished.game_id),
                        finished.queue_name,
                        finished.result
                    ),
                    None => format!("{}: you are not in an active game", author),
                }
            }
            Command::CreateQueue { name, size } => {
                let queue = self.manager.create_queue(&name, size).await?;
                format!("Created queue {} (size {})", queue.name, queue.size)
            }
            Command::RemoveQueue { name } => {
                if self.manager.remove_queue(&name).await? {
                    format!("Removed queue {}", name)
                } else {
                    format!("No queue named {}", name)
                }
            }
            Command::AddAdmin { player } => {
                if self.admins.add(&player)? {
                    format!("{} is now an admin", player)
                } else {
                    format!("{} is already an admin", player)
                }
            }
            Command::RemoveAdmin { player } => {
                if player == author {
                    "You cannot remove yourself as an admin".to_string()
                } else if self.admins.remove(&player)? {
                    format!("{} is no longer an admin", player)
                } else {
                    format!("{} is not an admin", player)
                }
            }
            Command::SetCommandPrefix { prefix: new_prefix } => {
                let mut current =
                    self.prefix
                        .write()
                        .map_err(|_| MatchmakingError::InternalError {
                            message: "Failed to acquire prefix lock".to_string(),
                        })?;
                info!(
                    "Command prefix changed from '{}' to '{}' by '{}'",
                    current, new_prefix, author
                );
                *current = new_prefix;
                format!("Command prefix set to {}", current)
            }
            Command::Coinflip => {
                if rand::thread_rng().gen_bool(0.5) {
                    "Heads".to_string()
                } else {
                    "Tails".to_string()
                }
            }
            Command::Commands => render_help(prefix),
        };

        Ok(reply)
    }
}
