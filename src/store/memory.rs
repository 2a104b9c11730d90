//! In-memory matchmaking store
//!
//! Writers are serialized behind a `RwLock`. Each transaction runs against a
//! working copy of the state that replaces the committed state only when the
//! operation succeeds, so a failed operation leaves nothing behind.

use crate::error::{MatchmakingError, Result};
use crate::store::state::MatchmakingState;
use crate::store::MatchmakingStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryMatchmakingStore {
    state: RwLock<MatchmakingState>,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

impl InMemoryMatchmakingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an existing state
    pub fn with_state(state: MatchmakingState) -> Self {
        Self {
            state: RwLock::new(state),
            ..Self::default()
        }
    }

    /// Number of committed transactions
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Number of transactions that were rolled back
    pub fn rollback_count(&self) -> u64 {
        self.rollbacks.load(Ordering::Relaxed)
    }
}

impl MatchmakingStore for InMemoryMatchmakingStore {
    fn read(&self, op: &mut dyn FnMut(&MatchmakingState)) -> Result<()> {
        let state = self
            .state
            .read()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire store read lock".to_string(),
            })?;

        op(&state);
        Ok(())
    }

    fn transact(&self, op: &mut dyn FnMut(&mut MatchmakingState) -> Result<()>) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire store write lock".to_string(),
            })?;

        let mut working = state.clone();
        match op(&mut working) {
            Ok(()) => {
                *state = working;
                self.commits.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.rollbacks.fetch_add(1, Ordering::Relaxed);
                debug!("Transaction rolled back: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MatchmakingStoreExt;

    #[test]
    fn test_transaction_commits_on_success() {
        let store = InMemoryMatchmakingStore::new();

        let count = store
            .transaction(|state| {
                state.ensure_player("opsayo");
                Ok(state.player_count())
            })
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(store.query(|state| state.player_count()).unwrap(), 1);
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = InMemoryMatchmakingStore::new();

        let result: Result<()> = store.transaction(|state| {
            state.ensure_player("opsayo");
            Err(MatchmakingError::InternalError {
                message: "boom".to_string(),
            }
            .into())
        });

        assert!(result.is_err());
        assert_eq!(store.query(|state| state.player_count()).unwrap(), 0);
        assert_eq!(store.commit_count(), 0);
        assert_eq!(store.rollback_count(), 1);
    }

    #[test]
    fn test_seeded_store() {
        let mut state = MatchmakingState::new();
        state.ensure_player("stork");

        let store = InMemoryMatchmakingStore::with_state(state);
        assert!(store.query(|state| state.player("stork").is_some()).unwrap());
    }
}
