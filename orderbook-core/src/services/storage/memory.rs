use std::sync::Mutex;

use async_trait::async_trait;

use super::IndexStore;
use crate::interfaces::error::StorageError;
use crate::interfaces::order::IndexState;

/// Keeps the snapshot in process memory. Used by the tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<IndexState>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: IndexState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            saves: Mutex::new(0),
        }
    }

    /// Number of `save` calls so far.
    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl IndexStore for MemoryStore {
    async fn load(&self) -> Result<Option<IndexState>, StorageError> {
        Ok(self.state.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, state: &IndexState) -> Result<(), StorageError> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Some(state.clone());
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
