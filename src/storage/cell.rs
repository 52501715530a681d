//! A value bound to a single storage slot.
//!
//! The slot is the source of truth on open. Every write is committed to the
//! slot before the in-memory value changes, so the two never diverge.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use super::{Storage, StorageError};

/// In-memory value mirrored to a named storage slot as JSON.
///
/// The value may be unset (`None`). Writing `None` removes the slot rather
/// than storing a `null` literal.
pub struct PersistentCell<T> {
    storage: Arc<dyn Storage>,
    key: String,
    value: Option<T>,
    revision: u64,
}

impl<T> PersistentCell<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the cell, falling back to `default` when the slot is absent or unreadable.
    pub fn open(storage: Arc<dyn Storage>, key: impl Into<String>, default: T) -> Self {
        Self::open_with(storage, key, || default)
    }

    /// Open the cell with a lazily produced default.
    ///
    /// `default` runs at most once, and only when nothing usable is stored.
    pub fn open_with<F>(storage: Arc<dyn Storage>, key: impl Into<String>, default: F) -> Self
    where
        F: FnOnce() -> T,
    {
        let key = key.into();
        let value = match load::<T>(storage.as_ref(), &key) {
            Some(stored) => stored,
            None => Some(default()),
        };

        Self {
            storage,
            key,
            value,
            revision: 0,
        }
    }

    /// Current value, `None` when unset.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Number of committed writes since the cell was opened.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the value and commit it.
    pub fn set(&mut self, value: Option<T>) -> Result<(), StorageError> {
        self.commit(value.as_ref())?;
        self.value = value;
        self.revision += 1;
        Ok(())
    }

    /// Compute the next value from the current one and commit it.
    ///
    /// `f` receives `None` when the cell is unset.
    pub fn update<F>(&mut self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(Option<&T>) -> Option<T>,
    {
        let next = f(self.value.as_ref());
        self.set(next)
    }

    fn commit(&self, value: Option<&T>) -> Result<(), StorageError> {
        match value {
            Some(value) => {
                let json = serde_json::to_string(value)?;
                self.storage.set_item(&self.key, &json)
            }
            None => self.storage.remove_item(&self.key),
        }
    }
}

/// Read and parse a slot.
///
/// Returns `None` when the slot is absent or cannot be used, `Some(None)` when
/// it holds a JSON `null`.
fn load<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<Option<T>> {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Error reading storage key {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Error parsing storage key {}: {}", key, e);
            None
        }
    }
}
