use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::IndexStore;
use crate::interfaces::error::StorageError;
use crate::interfaces::order::IndexState;

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "index.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl IndexStore for JsonFileStore {
    async fn load(&self) -> Result<Option<IndexState>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, state: &IndexState) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut bytes = serde_json::to_vec_pretty(state)?;
        bytes.push(b'\n');

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            "Saved index at block {} ({} orders) to {}",
            state.last_scanned_block,
            state.orders_by_key.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rpc::fake::{sell_order, ORDERBOOK};
    use alloy::primitives::B256;

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saves_into_a_fresh_directory_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("index.json"));

        let mut state = IndexState::new(31337, ORDERBOOK, 42);
        state.upsert_made(B256::repeat_byte(1), sell_order(7, 300), 40);
        store.save(&state).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(state));
        assert!(!store.tmp_path().exists());
    }

    #[tokio::test]
    async fn identical_states_produce_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("index.json"));

        let mut state = IndexState::new(1, ORDERBOOK, 10);
        state.upsert_made(B256::repeat_byte(9), sell_order(1, 100), 5);
        state.upsert_made(B256::repeat_byte(2), sell_order(2, 200), 6);

        store.save(&state).await.unwrap();
        let first = std::fs::read(store.path()).unwrap();
        store.save(&state.clone()).await.unwrap();
        let second = std::fs::read(store.path()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn corrupted_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = JsonFileStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Serde(_)));
    }
}
