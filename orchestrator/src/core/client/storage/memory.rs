use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::client::storage::{StorageClient, StorageError};

fn poison_err<T>(_: PoisonError<T>) -> StorageError {
    StorageError::LockPoisoned("memory storage lock poisoned".to_string())
}

/// Blob storage kept in a map, for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().map_err(poison_err)?.contains_key(key))
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn get_data(&self, key: &str) -> Result<Bytes, StorageError> {
        let objects = self.objects.read().map_err(poison_err)?;
        objects.get(key).cloned().ok_or_else(|| StorageError::ObjectNotFound(key.to_string()))
    }

    async fn put_data(&self, data: Bytes, key: &str) -> Result<(), StorageError> {
        self.objects.write().map_err(poison_err)?.insert(key.to_string(), data);
        Ok(())
    }

    async fn delete_data(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().map_err(poison_err)?.remove(key);
        Ok(())
    }
}
