//! Key-value persistence for the cart and wishlist records.
//!
//! Each store serializes its whole state to a JSON string and writes it under
//! a fixed key after every mutation. `JsonFileStorage` keeps one file per key
//! in the data directory; `MemoryStorage` backs tests and ephemeral sessions.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

/// Storage key of the persisted cart record.
pub const CART_STORAGE_KEY: &str = "chillhous-cart";

/// Storage key of the persisted wishlist record.
pub const WISHLIST_STORAGE_KEY: &str = "wishlist-storage";

/// Errors from reading or writing persisted records.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("Storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Record could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Flat key-value record storage.
pub trait KeyValueStorage: Send + Sync {
    /// Read the record stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the record stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// JsonFileStorage
// =============================================================================

/// One `<key>.json` file per key under a data directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage rooted at `dir`. The directory is created lazily.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key)(e)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(io_error(key))?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));

        fs::write(&tmp, value).map_err(io_error(key))?;
        fs::rename(&tmp, &path).map_err(io_error(key))?;

        debug!(key, path = %path.display(), "Persisted record");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key)(e)),
        }
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("data"));

        assert_eq!(storage.load(CART_STORAGE_KEY).unwrap(), None);

        storage.save(CART_STORAGE_KEY, r#"{"lines":[]}"#).unwrap();
        assert_eq!(
            storage.load(CART_STORAGE_KEY).unwrap().as_deref(),
            Some(r#"{"lines":[]}"#)
        );
        assert!(dir.path().join("data/chillhous-cart.json").exists());

        storage.save(CART_STORAGE_KEY, "{}").unwrap();
        assert_eq!(storage.load(CART_STORAGE_KEY).unwrap().as_deref(), Some("{}"));
        assert!(!dir.path().join("data/.chillhous-cart.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_remove_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());

        storage.remove(WISHLIST_STORAGE_KEY).unwrap();
        storage.save(WISHLIST_STORAGE_KEY, "[]").unwrap();
        storage.remove(WISHLIST_STORAGE_KEY).unwrap();
        assert_eq!(storage.load(WISHLIST_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.save("a", "1").unwrap();
        storage.save("b", "2").unwrap();
        storage.remove("a").unwrap();

        assert_eq!(storage.load("a").unwrap(), None);
        assert_eq!(storage.load("b").unwrap().as_deref(), Some("2"));
    }
}
