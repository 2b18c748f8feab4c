//! Durable, versioned blob store for cache persistence.
//!
//! Mirrors the shape of a versioned object database: a named store holds
//! a version marker and one named record space; records are opaque byte
//! blobs addressed by a fixed key. The worker touches it during bootstrap
//! and after each mutating craft.
//!
//! On-disk layout:
//!
//! ```text
//! <root>/<name>/VERSION            store schema version
//! <root>/<name>/<space>/<key>      one blob per key
//! ```
//!
//! Every operation is a discrete awaited transaction; the store is never
//! accessed concurrently for the same key by this crate.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

const VERSION_FILE: &str = "VERSION";

/// Store-related errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error during store operations.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The on-disk store was created by a newer schema than requested.
    #[error("store version mismatch: on disk {found}, requested {requested}")]
    VersionMismatch { found: u32, requested: u32 },

    /// The version marker exists but is not a number.
    #[error("corrupt version marker: {0:?}")]
    CorruptVersion(String),
}

/// Configuration for opening a [`BlobStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory under which named stores live.
    pub root: PathBuf,
    /// Store name (becomes a directory under `root`).
    pub name: String,
    /// Schema version. Opening with a higher version than on disk
    /// recreates the record space; a lower version is an error.
    pub version: u32,
    /// Record space name (subdirectory of the store).
    pub space: String,
    /// Fixed key under which the cache blob is stored.
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".bagcraft"),
            name: "crafting-cache".to_string(),
            version: 1,
            space: "crafting-cache-store".to_string(),
            key: "crafting-cache-item".to_string(),
        }
    }
}

/// Handle to an open, versioned blob store.
///
/// Obtained from [`BlobStore::open`]; all further operations are scoped
/// to the configured record space.
#[derive(Debug)]
pub struct BlobStore {
    space_dir: PathBuf,
    key: String,
}

impl BlobStore {
    /// Opens (or creates) the named store and its record space.
    ///
    /// A first-ever open (no version marker on disk) creates the record
    /// space. An upgrade from an older version drops and recreates the
    /// space, then records the new version.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, on a corrupt version marker, and when the
    /// on-disk version is newer than the requested one.
    pub async fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let store_dir = config.root.join(&config.name);
        fs::create_dir_all(&store_dir).await?;

        let space_dir = store_dir.join(&config.space);
        let found = read_version(&store_dir).await?;

        match found {
            None => {
                info!(store = %config.name, version = config.version, "creating store");
                fs::create_dir_all(&space_dir).await?;
                write_version(&store_dir, config.version).await?;
            }
            Some(found) if found < config.version => {
                warn!(
                    store = %config.name,
                    from = found,
                    to = config.version,
                    "upgrading store, dropping record space"
                );
                if fs::try_exists(&space_dir).await? {
                    fs::remove_dir_all(&space_dir).await?;
                }
                fs::create_dir_all(&space_dir).await?;
                write_version(&store_dir, config.version).await?;
            }
            Some(found) if found > config.version => {
                return Err(StoreError::VersionMismatch {
                    found,
                    requested: config.version,
                });
            }
            Some(_) => {
                // Same version. The space should exist, but tolerate a
                // partially created store from an interrupted first open.
                fs::create_dir_all(&space_dir).await?;
            }
        }

        Ok(Self {
            space_dir,
            key: config.key,
        })
    }

    /// Reads the blob under the configured key.
    ///
    /// Returns `None` when the key has never been written.
    pub async fn get(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.key_path();
        match fs::read(&path).await {
            Ok(data) => {
                debug!(key = %self.key, bytes = data.len(), "store read");
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the blob under the configured key.
    ///
    /// The write goes to a temporary file first and is published with a
    /// rename, so a crash mid-write never leaves a truncated blob behind.
    pub async fn put(&self, data: &[u8]) -> Result<(), StoreError> {
        let path = self.key_path();
        let tmp = self.space_dir.join(format!("{}.tmp", self.key));
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &path).await?;
        debug!(key = %self.key, bytes = data.len(), "store write");
        Ok(())
    }

    fn key_path(&self) -> PathBuf {
        self.space_dir.join(&self.key)
    }
}

async fn read_version(store_dir: &Path) -> Result<Option<u32>, StoreError> {
    let path = store_dir.join(VERSION_FILE);
    match fs::read_to_string(&path).await {
        Ok(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<u32>()
                .map(Some)
                .map_err(|_| StoreError::CorruptVersion(trimmed.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_version(store_dir: &Path, version: u32) -> Result<(), StoreError> {
    fs::write(store_dir.join(VERSION_FILE), version.to_string()).await?;
    Ok(())
}
