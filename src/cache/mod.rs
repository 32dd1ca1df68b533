//! Key-value cache backends for the cache-aside repository.
//!
//! Values are opaque bytes under string keys. Every backend is best-effort:
//! callers treat any [`CacheError`] as a miss.

mod disk;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use disk::SledCache;
pub use memory::MemoryCache;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache operation timed out after {0}ms")]
    Timeout(u64),
}

#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Insert or overwrite.
    async fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    fn name(&self) -> &'static str;
}
