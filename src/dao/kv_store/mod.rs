/// Directory-backed store, one file per key.
pub mod file;
/// Process-local store used for tests and ephemeral runs.
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

/// Durable string key-value store holding the scoring cache.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
