pub mod error;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
pub use error::StorageError;

/// Keyed blob storage for job inputs and step log excerpts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Fetch the object stored under `key`, [`StorageError::ObjectNotFound`] if absent
    async fn get_data(&self, key: &str) -> Result<Bytes, StorageError>;
    /// Store `data` under `key`, replacing any previous object
    async fn put_data(&self, data: Bytes, key: &str) -> Result<(), StorageError>;
    /// Remove the object stored under `key`
    async fn delete_data(&self, key: &str) -> Result<(), StorageError>;
}
