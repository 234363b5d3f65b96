//! Local persistence adapter.
//!
//! Emulates the host database on top of page-local key/value storage:
//! documents under `db:<id>`, attachments under `dbAttachment:<id>`, and
//! `dbStorage` values under their raw key. Nothing here raises to plugin code;
//! failures come back as [`DbReturn`] records or `None`.

pub mod db;
pub mod kv;

pub use db::{DbDoc, DbReturn, DocRef, LocalDb};
pub use kv::DbStorage;

use crate::error::StorageError;
use std::collections::BTreeMap;

pub const DOC_PREFIX: &str = "db:";
pub const ATTACHMENT_PREFIX: &str = "dbAttachment:";

/// Roughly what browsers grant `localStorage` per origin.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// The `localStorage` surface the adapter relies on.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
    /// Every stored key, in the backend's enumeration order.
    fn keys(&self) -> Vec<String>;
}

/// In-memory `localStorage` with a byte quota over keys plus values.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    quota_bytes: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }
}

impl MemoryStorage {
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            quota_bytes,
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let replaced = self.items.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
        let projected = self.used_bytes() - replaced + key.len() + value.len();
        if projected > self.quota_bytes {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_counts_keys_and_values() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set_item("ab", "cdef").unwrap();
        assert_eq!(storage.used_bytes(), 6);
        let err = storage.set_item("gh", "ijk").unwrap_err();
        assert_eq!(err, StorageError::QuotaExceeded { key: "gh".into() });
        assert_eq!(storage.get_item("gh"), None);
    }

    #[test]
    fn overwrite_only_charges_the_difference() {
        let mut storage = MemoryStorage::with_quota(8);
        storage.set_item("k", "1234567").unwrap();
        storage.set_item("k", "7654321").unwrap();
        assert_eq!(storage.get_item("k").as_deref(), Some("7654321"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn removing_missing_key_is_fine() {
        let mut storage = MemoryStorage::default();
        assert!(storage.remove_item("nope").is_ok());
        assert!(storage.is_empty());
    }
}
