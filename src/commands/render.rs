//! Plain-text rendering of replies and announcements

use crate::types::{
    ActiveGame, GameFinished, GameFormed, MatchmakingEvent, MatchmakingStatus, PlayerId,
    PlayerQueued, Team,
};
use crate::utils::short_id;
use std::fmt::Write;

/// Render the "status" view: every queue, then every active game
pub fn render_status(status: &MatchmakingStatus) -> String {
    let mut out = String::new();

    if status.queues.is_empty() {
        out.push_str("No queues");
    }
    for (i, queue) in status.queues.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{} [{}/{}]",
            queue.name,
            queue.players.len(),
            queue.size
        );
        if !queue.players.is_empty() {
            let _ = write!(out, ": {}", queue.players.join(", "));
        }
    }

    if !status.active_games.is_empty() {
        out.push_str("\nActive games:");
        for game in &status.active_games {
            let _ = write!(out, "\n  {}", render_active_game(game));
        }
    }

    out
}

fn render_active_game(game: &ActiveGame) -> String {
    format!(
        "{} ({}): {}",
        game.queue_name,
        short_id(&game.game_id),
        render_teams(&game.team_a, &game.team_b)
    )
}

fn render_teams(team_a: &[PlayerId], team_b: &[PlayerId]) -> String {
    format!(
        "{}: {} | {}: {}",
        Team::A,
        team_a.join(", "),
        Team::B,
        team_b.join(", ")
    )
}

pub fn render_player_queued(event: &PlayerQueued) -> String {
    format!(
        "{} joined {}",
        event.player_id,
        event.queue_names.join(", ")
    )
}

/// Announcement for a popped queue
pub fn render_game_formed(event: &GameFormed) -> String {
    format!(
        "Game {} is ready for {}! {}",
        short_id(&event.game_id),
        event.queue_name,
        render_teams(&event.team_a, &event.team_b)
    )
}

pub fn render_game_finished(event: &GameFinished) -> String {
    format!(
        "Game {} ({}) finished: {}",
        short_id(&event.game_id),
        event.queue_name,
        event.result
    )
}

/// One-line rendering of any outbound event
pub fn render_event(event: &MatchmakingEvent) -> String {
    match event {
        MatchmakingEvent::PlayerQueued(e) => render_player_queued(e),
        MatchmakingEvent::GameFormed(e) => render_game_formed(e),
        MatchmakingEvent::GameFinished(e) => render_game_finished(e),
    }
}

/// Help text listing every command
pub fn render_help(prefix: &str) -> String {
    let commands = [
        ("add [queue]", "join one queue, or every queue"),
        ("del [queue]", "leave one queue, or every queue"),
        ("status", "show queues and active games"),
        ("finishgame win|loss|draw", "report your game's result"),
        ("coinflip", "flip a coin"),
        ("commands", "show this list"),
        ("createqueue <name> <size>", "(admin) create a queue"),
        ("removequeue <name>", "(admin) remove a queue"),
        ("addadmin <player>", "(admin) grant admin rights"),
        ("removeadmin <player>", "(admin) revoke admin rights"),
        ("setcommandprefix <prefix>", "(admin) change the command prefix"),
    ];

    commands
        .iter()
        .map(|(usage, description)| format!("{}{} - {}", prefix, usage, description))
        .collect::<Vec<_>>()
        .join("\n")
}
