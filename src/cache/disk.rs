//! Embedded on-disk cache using sled.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use super::{CacheError, CacheResult, KeyValueCache};

pub struct SledCache {
    db: sled::Db,
}

impl From<sled::Error> for CacheError {
    fn from(e: sled::Error) -> Self {
        CacheError::Backend(e.to_string())
    }
}

impl SledCache {
    /// Open (or create) a cache directory.
    pub fn open<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let path = path.as_ref();
        info!("Opening sled cache at {}", path.display());
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    /// Cache that is removed when dropped.
    pub fn temporary() -> CacheResult<Self> {
        Ok(Self {
            db: sled::Config::new().temporary(true).open()?,
        })
    }

    /// Run a sled call on the blocking pool. sled does disk I/O inline, and a
    /// stalled call must not hold a runtime worker past the cache timeout.
    async fn blocking<T, F>(&self, op: F) -> CacheResult<T>
    where
        F: FnOnce(&sled::Db) -> sled::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?
            .map_err(CacheError::from)
    }
}

#[async_trait]
impl KeyValueCache for SledCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let key = key.to_string();
        self.blocking(move |db| Ok(db.get(key)?.map(|v| v.to_vec())))
            .await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()> {
        let key = key.to_string();
        self.blocking(move |db| db.insert(key, value).map(|_| ()))
            .await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let key = key.to_string();
        self.blocking(move |db| db.remove(key).map(|_| ())).await
    }

    fn name(&self) -> &'static str {
        "sled"
    }
}
