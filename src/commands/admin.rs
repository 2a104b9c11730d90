//! Admin registry for gated chat commands

use crate::error::{MatchmakingError, Result};
use crate::types::PlayerId;
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::info;

/// Set of players allowed to run admin commands
#[derive(Debug, Default)]
pub struct AdminRegistry {
    admins: RwLock<HashSet<PlayerId>>,
}

impl AdminRegistry {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PlayerId>,
    {
        Self {
            admins: RwLock::new(admins.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_admin(&self, player_id: &str) -> Result<bool> {
        Ok(self.read()?.contains(player_id))
    }

    /// Grant admin rights, returning false if already granted
    pub fn add(&self, player_id: &str) -> Result<bool> {
        let added = self.write()?.insert(player_id.to_string());
        if added {
            info!("Granted admin rights to '{}'", player_id);
        }
        Ok(added)
    }

    /// Revoke admin rights, returning false if the player was not an admin
    pub fn remove(&self, player_id: &str) -> Result<bool> {
        let removed = self.write()?.remove(player_id);
        if removed {
            info!("Revoked admin rights from '{}'", player_id);
        }
        Ok(removed)
    }

    /// Admins in sorted order
    pub fn list(&self) -> Result<Vec<PlayerId>> {
        let mut admins: Vec<_> = self.read()?.iter().cloned().collect();
        admins.sort();
        Ok(admins)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashSet<PlayerId>>> {
        self.admins.read().map_err(|_| {
            MatchmakingError::InternalError {
                message: "Failed to acquire admins lock".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashSet<PlayerId>>> {
        self.admins.write().map_err(|_| {
            MatchmakingError::InternalError {
                message: "Failed to acquire admins lock".to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_admins() {
        let registry = AdminRegistry::new(["opsayo"]);
        assert!(registry.is_admin("opsayo").unwrap());
        assert!(!registry.is_admin("lyon").unwrap());

        assert!(registry.add("lyon").unwrap());
        assert!(!registry.add("lyon").unwrap());
        assert_eq!(
            registry.list().unwrap(),
            vec!["lyon".to_string(), "opsayo".to_string()]
        );

        assert!(registry.remove("lyon").unwrap());
        assert!(!registry.remove("lyon").unwrap());
        assert!(!registry.is_admin("lyon").unwrap());
    }
}
