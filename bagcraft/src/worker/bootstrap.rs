//! Cache bootstrap: produce a ready-to-use cache exactly once at startup.

use thiserror::Error;
use tracing::{info, warn};

use crate::engine::{CraftingCache, EngineError};
use crate::store::{BlobStore, StoreError};

/// Errors that abort worker startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The durable store could not be opened, read, or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A fresh cache could not be serialized for its initial write.
    #[error("failed to encode fresh cache: {0}")]
    Encode(#[from] EngineError),
}

/// Loads the persisted cache, or creates and persists a fresh one.
///
/// A blob that fails to decode (corrupt or written by an incompatible
/// build) is not fatal: it is logged and replaced by a rebuilt fresh
/// cache, so a bad blob can't brick the worker. Store failures do abort
/// startup.
pub async fn load_or_create_cache(store: &BlobStore) -> Result<CraftingCache, BootstrapError> {
    match store.get().await? {
        Some(blob) => match CraftingCache::deserialize(&blob) {
            Ok(cache) => {
                info!(recipes = cache.len(), "loaded persisted crafting cache");
                Ok(cache)
            }
            Err(e) => {
                warn!(error = %e, "persisted cache blob is corrupt, rebuilding");
                persist_fresh(store).await
            }
        },
        None => {
            info!("no persisted cache found, creating one");
            persist_fresh(store).await
        }
    }
}

async fn persist_fresh(store: &BlobStore) -> Result<CraftingCache, BootstrapError> {
    let cache = CraftingCache::new();
    store.put(&cache.serialize()?).await?;
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> BlobStore {
        let config = StoreConfig {
            root: dir.path().to_path_buf(),
            ..StoreConfig::default()
        };
        BlobStore::open(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_fresh_cache_is_created_and_persisted() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let cache = load_or_create_cache(&store).await.unwrap();
        assert!(cache.is_empty());

        // The blob was written under the fixed key.
        assert!(store.get().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_second_bootstrap_loads_the_same_cache() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        load_or_create_cache(&store).await.unwrap();

        let store = open_store(&dir).await;
        let cache = load_or_create_cache(&store).await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_rebuilt() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.put(b"garbage").await.unwrap();

        let cache = load_or_create_cache(&store).await.unwrap();
        assert!(cache.is_empty());

        // The garbage was replaced by a valid blob.
        let blob = store.get().await.unwrap().unwrap();
        assert!(CraftingCache::deserialize(&blob).is_ok());
    }
}
