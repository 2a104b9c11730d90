//! Transactional storage for matchmaking state
//!
//! The store is the only owner of player, queue and game state. Every
//! mutation runs inside `transact`, which must either apply the whole
//! operation or none of it.

pub mod memory;
pub mod state;

pub use memory::InMemoryMatchmakingStore;
pub use state::MatchmakingState;

use crate::error::{MatchmakingError, Result};

/// Trait for matchmaking storage backends
pub trait MatchmakingStore: Send + Sync {
    /// Run a read-only operation against committed state
    fn read(&self, op: &mut dyn FnMut(&MatchmakingState)) -> Result<()>;

    /// Run a mutating operation as one atomic transaction
    ///
    /// If `op` returns an error, none of its changes may become visible.
    fn transact(&self, op: &mut dyn FnMut(&mut MatchmakingState) -> Result<()>) -> Result<()>;
}

/// Typed helpers on top of the object-safe store interface
pub trait MatchmakingStoreExt: MatchmakingStore {
    /// Compute a value from committed state
    fn query<R>(&self, op: impl FnOnce(&MatchmakingState) -> R) -> Result<R> {
        let mut op = Some(op);
        let mut output = None;
        self.read(&mut |state| {
            if let Some(op) = op.take() {
                output = Some(op(state));
            }
        })?;
        output.ok_or_else(|| not_run("query"))
    }

    /// Run a transaction and return its value
    fn transaction<R>(&self, op: impl FnOnce(&mut MatchmakingState) -> Result<R>) -> Result<R> {
        let mut op = Some(op);
        let mut output = None;
        self.transact(&mut |state| {
            let op = op.take().ok_or_else(|| not_run("transaction"))?;
            output = Some(op(state)?);
            Ok(())
        })?;
        output.ok_or_else(|| not_run("transaction"))
    }
}

impl<S: MatchmakingStore + ?Sized> MatchmakingStoreExt for S {}

fn not_run(what: &str) -> anyhow::Error {
    MatchmakingError::InternalError {
        message: format!("Store did not run the {}", what),
    }
    .into()
}
