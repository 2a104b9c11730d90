//! Queue registry: creating, removing and listing named queues

use crate::error::{MatchmakingError, Result};
use crate::store::MatchmakingState;
use crate::types::Queue;
use crate::utils::{current_timestamp, generate_queue_id};

/// Smallest queue that can pop into a game (one player per team)
pub const MIN_QUEUE_SIZE: usize = 2;

/// Check that a queue size is even and at least two
pub fn validate_queue_size(size: usize) -> Result<()> {
    if size < MIN_QUEUE_SIZE || size % 2 != 0 {
        return Err(MatchmakingError::InvalidQueueSize { size }.into());
    }
    Ok(())
}

/// Check that a queue name can be addressed as a single command argument
pub fn validate_queue_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MatchmakingError::InvalidQueueName {
            name: name.to_string(),
            reason: "name cannot be empty".to_string(),
        }
        .into());
    }

    if name.chars().any(char::is_whitespace) {
        return Err(MatchmakingError::InvalidQueueName {
            name: name.to_string(),
            reason: "name cannot contain whitespace".to_string(),
        }
        .into());
    }

    Ok(())
}

/// Create a new empty queue
pub fn create_queue(state: &mut MatchmakingState, name: &str, size: usize) -> Result<Queue> {
    validate_queue_name(name)?;
    validate_queue_size(size)?;

    if state.queue_by_name(name).is_some() {
        return Err(MatchmakingError::DuplicateQueueName {
            name: name.to_string(),
        }
        .into());
    }

    let queue = Queue {
        id: generate_queue_id(),
        name: name.to_string(),
        size,
        created_at: current_timestamp(),
    };
    state.insert_queue(queue.clone());

    Ok(queue)
}

/// Remove a queue and its memberships; absent queues are ignored
pub fn remove_queue(state: &mut MatchmakingState, name: &str) -> Option<Queue> {
    let queue_id = state.queue_by_name(name)?.id;
    state.remove_queue(queue_id)
}

/// All registered queues in creation order
pub fn list_queues(state: &MatchmakingState) -> Vec<Queue> {
    state.queues().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_of(result: Result<Queue>) -> MatchmakingError {
        result
            .unwrap_err()
            .downcast::<MatchmakingError>()
            .expect("expected a matchmaking error")
    }

    #[test]
    fn test_queue_size_validation() {
        assert!(validate_queue_size(2).is_ok());
        assert!(validate_queue_size(10).is_ok());
        assert!(validate_queue_size(0).is_err());
        assert!(validate_queue_size(1).is_err());
        assert!(validate_queue_size(5).is_err());
    }

    #[test]
    fn test_create_queue() {
        let mut state = MatchmakingState::new();

        let queue = create_queue(&mut state, "LTpug", 10).unwrap();
        assert_eq!(queue.name, "LTpug");
        assert_eq!(queue.size, 10);
        assert_eq!(queue.team_size(), 5);
        assert_eq!(list_queues(&state), vec![queue]);
    }

    #[test]
    fn test_create_queue_with_odd_size_is_rejected() {
        let mut state = MatchmakingState::new();

        let error = error_of(create_queue(&mut state, "LTgold", 5));
        assert!(matches!(error, MatchmakingError::InvalidQueueSize { size: 5 }));
        assert!(list_queues(&state).is_empty());
    }

    #[test]
    fn test_create_queue_with_duplicate_name_is_rejected() {
        let mut state = MatchmakingState::new();
        create_queue(&mut state, "LTpug", 4).unwrap();

        let error = error_of(create_queue(&mut state, "LTpug", 8));
        assert!(matches!(error, MatchmakingError::DuplicateQueueName { .. }));
        assert_eq!(list_queues(&state).len(), 1);
        assert_eq!(list_queues(&state)[0].size, 4);
    }

    #[test]
    fn test_queue_names_are_case_sensitive() {
        let mut state = MatchmakingState::new();
        create_queue(&mut state, "LTpug", 4).unwrap();

        assert!(create_queue(&mut state, "ltpug", 4).is_ok());
        assert_eq!(list_queues(&state).len(), 2);
    }

    #[test]
    fn test_create_queue_with_bad_name_is_rejected() {
        let mut state = MatchmakingState::new();

        let error = error_of(create_queue(&mut state, "", 4));
        assert!(matches!(error, MatchmakingError::InvalidQueueName { .. }));

        let error = error_of(create_queue(&mut state, "LT pug", 4));
        assert!(error.is_validation());
    }

    #[test]
    fn test_remove_queue() {
        let mut state = MatchmakingState::new();
        create_queue(&mut state, "LTpug", 10).unwrap();

        assert!(remove_queue(&mut state, "LTpug").is_some());
        assert!(list_queues(&state).is_empty());
    }

    #[test]
    fn test_remove_nonexistent_queue_is_noop() {
        let mut state = MatchmakingState::new();
        create_queue(&mut state, "LTpug", 10).unwrap();

        assert!(remove_queue(&mut state, "LTunrated").is_none());
        assert_eq!(list_queues(&state).len(), 1);
    }
}
