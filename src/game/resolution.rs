//! Game resolution: recording a reported outcome
//!
//! The first report from any participant of an unresolved game decides it.
//! Later reports find no unresolved game for the reporter and do nothing.

use crate::store::MatchmakingState;
use crate::types::{GameFinished, Outcome};
use crate::utils::current_timestamp;

/// Record `outcome` for the unresolved game `player_id` belongs to
///
/// Returns `None` when the player is not in an active game.
pub fn finish_game(
    state: &mut MatchmakingState,
    player_id: &str,
    outcome: Outcome,
) -> Option<GameFinished> {
    let (game_id, team) = state
        .unresolved_game_for(player_id)
        .map(|(game, membership)| (game.id, membership.team))?;

    let result = outcome.result_for(team);
    let timestamp = current_timestamp();

    let game = state.game_mut(game_id)?;
    if game.result.is_some() {
        return None;
    }
    game.result = Some(result);
    game.finished_at = Some(timestamp);

    Some(GameFinished {
        game_id,
        queue_name: game.queue_name.clone(),
        reported_by: player_id.to_string(),
        outcome,
        result,
        timestamp,
    })
}
