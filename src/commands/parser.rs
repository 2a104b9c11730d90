//! Text command parsing
//!
//! A message is a command when it starts with the configured prefix directly
//! followed by a known command word. Arguments are whitespace separated.

use crate::types::Outcome;
use thiserror::Error;

/// A parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join one queue or every queue
    Add { queue: Option<String> },
    /// Leave one queue or every queue
    Del { queue: Option<String> },
    /// Show queues and active games
    Status,
    /// Report the result of the author's active game
    FinishGame { outcome: Outcome },
    CreateQueue { name: String, size: usize },
    RemoveQueue { name: String },
    AddAdmin { player: String },
    RemoveAdmin { player: String },
    SetCommandPrefix { prefix: String },
    Coinflip,
    /// List available commands
    Commands,
}

/// A recognized command with unusable arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Usage: {prefix}{usage}")]
    Usage { prefix: String, usage: &'static str },

    #[error("{message}")]
    InvalidArgument { message: String },
}

impl Command {
    /// Parse a message into a command
    ///
    /// Returns `Ok(None)` for messages without the prefix and for unknown
    /// command words; those are not addressed to us.
    pub fn parse(prefix: &str, text: &str) -> Result<Option<Command>, CommandError> {
        let body = match text.trim().strip_prefix(prefix) {
            Some(body) if !body.starts_with(char::is_whitespace) => body,
            _ => return Ok(None),
        };

        let mut words = body.split_whitespace();
        let name = match words.next() {
            Some(name) => name.to_lowercase(),
            None => return Ok(None),
        };
        let args: Vec<&str> = words.collect();

        let usage = |usage: &'static str| CommandError::Usage {
            prefix: prefix.to_string(),
            usage,
        };

        let command = match name.as_str() {
            "add" => Command::Add {
                queue: optional_arg(&args).ok_or_else(|| usage("add [queue]"))?,
            },
            "del" => Command::Del {
                queue: optional_arg(&args).ok_or_else(|| usage("del [queue]"))?,
            },
            "status" => Command::Status,
            "finishgame" => {
                let outcome = match args.as_slice() {
                    [outcome] => outcome
                        .parse::<Outcome>()
                        .map_err(|message| CommandError::InvalidArgument { message })?,
                    _ => return Err(usage("finishgame win|loss|draw")),
                };
                Command::FinishGame { outcome }
            }
            "createqueue" => match args.as_slice() {
                [name, size] => Command::CreateQueue {
                    name: name.to_string(),
                    size: size.parse::<usize>().map_err(|_| CommandError::InvalidArgument {
                        message: format!("Queue size must be a number, got '{}'", size),
                    })?,
                },
                _ => return Err(usage("createqueue <name> <size>")),
            },
            "removequeue" => Command::RemoveQueue {
                name: single_arg(&args).ok_or_else(|| usage("removequeue <name>"))?,
            },
            "addadmin" => Command::AddAdmin {
                player: single_arg(&args).ok_or_else(|| usage("addadmin <player>"))?,
            },
            "removeadmin" => Command::RemoveAdmin {
                player: single_arg(&args).ok_or_else(|| usage("removeadmin <player>"))?,
            },
            "setcommandprefix" => Command::SetCommandPrefix {
                prefix: single_arg(&args).ok_or_else(|| usage("setcommandprefix <prefix>"))?,
            },
            "coinflip" => Command::Coinflip,
            "commands" => Command::Commands,
            _ => return Ok(None),
        };

        Ok(Some(command))
    }

    /// Command word, used for metrics and refusals
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Del { .. } => "del",
            Command::Status => "status",
            Command::FinishGame { .. } => "finishgame",
            Command::CreateQueue { .. } => "createqueue",
            Command::RemoveQueue { .. } => "removequeue",
            Command::AddAdmin { .. } => "addadmin",
            Command::RemoveAdmin { .. } => "removeadmin",
            Command::SetCommandPrefix { .. } => "setcommandprefix",
            Command::Coinflip => "coinflip",
            Command::Commands => "commands",
        }
    }

    /// Whether only admins may run this command
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::CreateQueue { .. }
                | Command::RemoveQueue { .. }
                | Command::AddAdmin { .. }
                | Command::RemoveAdmin { .. }
                | Command::SetCommandPrefix { .. }
        )
    }
}

/// `Some(None)` for no argument, `Some(Some(arg))` for one, `None` for more
fn optional_arg(args: &[&str]) -> Option<Option<String>> {
    match args {
        [] => Some(None),
        [arg] => Some(Some(arg.to_string())),
        _ => None,
    }
}

fn single_arg(args: &[&str]) -> Option<String> {
    match args {
        [arg] => Some(arg.to_string()),
        _ => None,
    }
}
