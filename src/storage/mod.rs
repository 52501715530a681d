//! Key-value storage for persisted collections.
//!
//! A slot is a named string value. [`FileStorage`] keeps one file per slot on
//! disk, [`MemoryStorage`] keeps slots in a map for tests and ephemeral runs.

mod cell;
mod file;

pub use cell::*;
pub use file::*;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Errors raised by a storage backend.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying I/O failed
    Io(std::io::Error),
    /// Value could not be serialized before commit
    Serialize(serde_json::Error),
    /// Key contains characters that cannot name a slot
    InvalidKey(String),
    /// Backend refused the operation
    Unavailable(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "I/O error: {}", err),
            StorageError::Serialize(err) => write!(f, "serialization failed: {}", err),
            StorageError::InvalidKey(key) => write!(f, "invalid storage key {:?}", key),
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(err) => Some(err),
            StorageError::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialize(err)
    }
}

/// A string-keyed slot store.
///
/// Calls are synchronous: a successful `set_item` has reached the backend
/// by the time it returns.
pub trait Storage: Send + Sync {
    /// Read the raw value of a slot, `None` when the slot is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value of a slot.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a slot. Removing an absent slot succeeds.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set_item`/`remove_item` fail until reset.
    #[cfg(test)]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        Ok(())
    }

    fn slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.slots
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.slots()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.slots()?.remove(key);
        Ok(())
    }
}
