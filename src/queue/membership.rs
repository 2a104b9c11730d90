//! Queue membership: adding and removing players
//!
//! All "nothing to do" situations (unknown queue, already queued, player in
//! an active game, not queued on removal) are silent no-ops. Callers observe
//! only the returned delta.

use crate::store::MatchmakingState;
use crate::types::{Queue, QueueId, QueueMembership};
use crate::utils::current_timestamp;

/// Resolve the queues an add/remove request targets
///
/// A named request targets that queue only (nothing if it does not exist);
/// an unnamed request targets every registered queue.
pub fn target_queues(state: &MatchmakingState, queue_name: Option<&str>) -> Vec<QueueId> {
    match queue_name {
        Some(name) => state.queue_by_name(name).map(|q| q.id).into_iter().collect(),
        None => state.queues().iter().map(|q| q.id).collect(),
    }
}

/// Whether a player is currently in an unresolved game
pub fn is_in_game(state: &MatchmakingState, player_id: &str) -> bool {
    state.unresolved_game_for(player_id).is_some()
}

/// Queue a player, returning the queues actually joined in creation order
///
/// This never pops a queue; the caller hands the joined queues to the
/// formation engine within the same transaction.
pub fn add_player(
    state: &mut MatchmakingState,
    player_id: &str,
    queue_name: Option<&str>,
) -> Vec<Queue> {
    if is_in_game(state, player_id) {
        return Vec::new();
    }

    let mut joined = Vec::new();
    for queue_id in target_queues(state, queue_name) {
        if state.has_membership(queue_id, player_id) {
            continue;
        }

        let queue = match state.queue(queue_id) {
            Some(queue) => queue.clone(),
            None => continue,
        };

        // A full queue would already have popped; guard anyway so the
        // membership count can never pass the target size.
        if state.membership_count(queue_id) >= queue.size {
            continue;
        }

        state.insert_membership(QueueMembership {
            queue_id,
            player_id: player_id.to_string(),
            joined_at: current_timestamp(),
        });
        joined.push(queue);
    }

    joined
}

/// Remove a player from the targeted queues, returning the names left
pub fn remove_player(
    state: &mut MatchmakingState,
    player_id: &str,
    queue_name: Option<&str>,
) -> Vec<String> {
    let mut left = Vec::new();
    for queue_id in target_queues(state, queue_name) {
        if state.remove_membership(queue_id, player_id) {
            if let Some(queue) = state.queue(queue_id) {
                left.push(queue.name.clone());
            }
        }
    }
    left
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::registry::create_queue;
    use crate::types::{Game, GameMembership, Team};
    use crate::utils::generate_game_id;

    fn state_with_queues(queues: &[(&str, usize)]) -> MatchmakingState {
        let mut state = MatchmakingState::new();
        for (name, size) in queues {
            create_queue(&mut state, name, *size).unwrap();
        }
        state
    }

    fn put_in_game(state: &mut MatchmakingState, player_id: &str) {
        let queue = state.queues()[0].clone();
        let game_id = generate_game_id();
        state.insert_game(
            Game {
                id: game_id,
                queue_id: queue.id,
                queue_name: queue.name,
                result: None,
                created_at: current_timestamp(),
                finished_at: None,
            },
            vec![GameMembership {
                game_id,
                player_id: player_id.to_string(),
                team: Team::A,
            }],
        );
    }

    fn count_in(state: &MatchmakingState, queue_name: &str, player_id: &str) -> usize {
        let queue_id = state.queue_by_name(queue_name).unwrap().id;
        state
            .memberships_for_queue(queue_id)
            .iter()
            .filter(|m| m.player_id == player_id)
            .count()
    }

    #[test]
    fn test_add_without_name_joins_every_queue() {
        let mut state = state_with_queues(&[("LTpug", 10), ("LTunrated", 10)]);

        let joined = add_player(&mut state, "opsayo", None);

        assert_eq!(joined.len(), 2);
        assert_eq!(count_in(&state, "LTpug", "opsayo"), 1);
        assert_eq!(count_in(&state, "LTunrated", "opsayo"), 1);
    }

    #[test]
    fn test_add_with_name_joins_only_that_queue() {
        let mut state = state_with_queues(&[("LTpug", 10), ("LTunrated", 10)]);

        let joined = add_player(&mut state, "opsayo", Some("LTpug"));

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].name, "LTpug");
        assert_eq!(count_in(&state, "LTpug", "opsayo"), 1);
        assert_eq!(count_in(&state, "LTunrated", "opsayo"), 0);
    }

    #[test]
    fn test_add_twice_is_idempotent() {
        let mut state = state_with_queues(&[("LTpug", 10)]);

        add_player(&mut state, "opsayo", None);
        let second = add_player(&mut state, "opsayo", None);

        assert!(second.is_empty());
        assert_eq!(count_in(&state, "LTpug", "opsayo"), 1);
    }

    #[test]
    fn test_add_to_unknown_queue_is_noop() {
        let mut state = state_with_queues(&[("LTpug", 10)]);

        let joined = add_player(&mut state, "opsayo", Some("LTgold"));

        assert!(joined.is_empty());
        assert!(state.queue_memberships().is_empty());
    }

    #[test]
    fn test_add_while_in_game_is_noop() {
        let mut state = state_with_queues(&[("LTpug", 2)]);
        put_in_game(&mut state, "opsayo");

        let joined = add_player(&mut state, "opsayo", None);

        assert!(joined.is_empty());
        assert!(state.queue_memberships().is_empty());
        assert!(is_in_game(&state, "opsayo"));
    }

    #[test]
    fn test_remove_without_name_leaves_every_queue() {
        let mut state = state_with_queues(&[("LTpug", 10), ("LTunrated", 10)]);
        add_player(&mut state, "opsayo", None);

        let left = remove_player(&mut state, "opsayo", None);

        assert_eq!(left, vec!["LTpug".to_string(), "LTunrated".to_string()]);
        assert!(state.queue_memberships().is_empty());
    }

    #[test]
    fn test_remove_with_name_keeps_other_queues() {
        let mut state = state_with_queues(&[("LTpug", 4), ("LTunrated", 10)]);
        add_player(&mut state, "opsayo", None);

        let left = remove_player(&mut state, "opsayo", Some("LTpug"));

        assert_eq!(left, vec!["LTpug".to_string()]);
        assert_eq!(count_in(&state, "LTpug", "opsayo"), 0);
        assert_eq!(count_in(&state, "LTunrated", "opsayo"), 1);
    }

    #[test]
    fn test_remove_when_not_queued_is_noop() {
        let mut state = state_with_queues(&[("LTpug", 4)]);
        add_player(&mut state, "stork", None);

        let left = remove_player(&mut state, "opsayo", None);

        assert!(left.is_empty());
        assert_eq!(count_in(&state, "LTpug", "stork"), 1);
    }
}
