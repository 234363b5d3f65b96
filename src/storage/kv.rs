//! `focusany.dbStorage`: JSON values under raw keys.

use super::KeyValueStorage;
use crate::error::StorageError;
use serde_json::Value;

pub struct DbStorage<'a> {
    storage: &'a mut dyn KeyValueStorage,
}

impl<'a> DbStorage<'a> {
    pub fn new(storage: &'a mut dyn KeyValueStorage) -> Self {
        Self { storage }
    }

    pub fn set_item(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        self.storage.set_item(key, &text)
    }

    /// Parsed value, or `Value::Null` when absent or unparsable.
    pub fn get_item(&self, key: &str) -> Value {
        let Some(raw) = self.storage.get_item(key) else {
            return Value::Null;
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::error!(key, error = %err, "dbStorage.getItem found unparsable JSON");
            Value::Null
        })
    }

    pub fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn values_round_trip_as_json_text() {
        let mut storage = MemoryStorage::default();
        let mut kv = DbStorage::new(&mut storage);
        kv.set_item("settings", &json!({"theme": "dark", "size": 14}))
            .unwrap();
        assert_eq!(kv.get_item("settings"), json!({"theme": "dark", "size": 14}));

        kv.remove_item("settings").unwrap();
        assert_eq!(kv.get_item("settings"), Value::Null);
        assert_eq!(storage.get_item("settings"), None);
    }

    #[test]
    fn unparsable_values_read_as_null() {
        let mut storage = MemoryStorage::default();
        storage.set_item("raw", "plain text").unwrap();
        let kv = DbStorage::new(&mut storage);
        assert_eq!(kv.get_item("raw"), Value::Null);
    }

    #[test]
    fn quota_errors_surface_to_the_caller() {
        let mut storage = MemoryStorage::with_quota(4);
        let mut kv = DbStorage::new(&mut storage);
        assert!(matches!(
            kv.set_item("key", &json!("value")),
            Err(StorageError::QuotaExceeded { .. })
        ));
    }
}
