//! Asynchronous key-value store contract.
//!
//! Values are JSON. There are no multi-key transactions and no schema
//! validation on the store side: [`load_record`] checks the shape after
//! retrieval and treats a mismatch as an absent record.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// A string-keyed store of JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value under `key`, or `None` if nothing was stored.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Volatile in-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `entries`.
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: RwLock::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Read and deserialize a record.
///
/// Returns `Ok(None)` when the key is absent or the stored value does not
/// match `T`; the mismatch is logged. Store failures propagate.
pub async fn load_record<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored record has unexpected shape, ignoring");
            Ok(None)
        }
    }
}

/// Serialize and write a whole record.
pub async fn save_record<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    record: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(record).map_err(|e| StoreError::WriteFailed {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, value).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: u32,
    }

    #[tokio::test]
    async fn memory_store_get_set() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());
        store.set("k", json!(true)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(true)));
        store.set("k", json!(false)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(false)));
    }

    #[tokio::test]
    async fn load_record_round_trips() {
        let store = MemoryStore::new();
        save_record(&store, "sample", &Sample { count: 3 }).await.unwrap();
        let loaded: Option<Sample> = load_record(&store, "sample").await.unwrap();
        assert_eq!(loaded, Some(Sample { count: 3 }));
    }

    #[tokio::test]
    async fn load_record_treats_wrong_shape_as_absent() {
        let store = MemoryStore::with_entries([("sample", json!({"count": "many"}))]);
        let loaded: Option<Sample> = load_record(&store, "sample").await.unwrap();
        assert!(loaded.is_none());
    }
}
