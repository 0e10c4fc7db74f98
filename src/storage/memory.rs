//! In-memory state backend.
//!
//! Volatile backend for tests and embedded use where durability is not
//! required; also serves as the reference implementation of the
//! [`StateBackend`] contract.

use std::sync::RwLock;

use crate::storage::traits::{PersistedState, StateBackend, StorageError};

/// Thread-safe in-memory backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<Option<PersistedState>>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        let guard = self
            .state
            .read()
            .map_err(|_| StorageError::Backend("poisoned lock: memory.load".to_string()))?;
        Ok(guard.clone())
    }

    fn store(&self, state: &PersistedState) -> Result<(), StorageError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| StorageError::Backend("poisoned lock: memory.store".to_string()))?;
        *guard = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_is_none_until_first_store() {
        let backend = MemoryBackend::new();
        assert!(backend.load().unwrap().is_none());

        backend.store(&PersistedState::default()).unwrap();
        assert_eq!(backend.load().unwrap(), Some(PersistedState::default()));
    }

    #[test]
    fn store_replaces_previous_state() {
        let backend = MemoryBackend::new();
        backend.store(&PersistedState::default()).unwrap();

        let mut next = PersistedState::default();
        next.karma
            .insert(crate::agent::AgentId::new("a").unwrap(), 42.0);
        backend.store(&next).unwrap();
        assert_eq!(backend.load().unwrap(), Some(next));
    }
}
