//! Persistence of the index snapshot.
//!
mod file;
mod memory;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;

use crate::interfaces::error::StorageError;
use crate::interfaces::order::IndexState;

/// Where the indexer keeps its snapshot between passes.
///
/// The indexer is the only writer. `save` must be atomic with respect to
/// `load`: a reader never observes a partially written state.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Returns `None` when nothing was persisted yet.
    async fn load(&self) -> Result<Option<IndexState>, StorageError>;

    async fn save(&self, state: &IndexState) -> Result<(), StorageError>;
}
