//! Cache-aside decorator over any [`AdminAreaRepository`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AdminAreaRepository, CacheKey};
use crate::cache::{CacheError, CacheResult, KeyValueCache};
use crate::error::LookupResult;
use crate::models::{AdminArea, AdminLevel, AreaCode, GeoPoint, Tolerance};
use crate::validation::validate_children;

/// Default bound on a single cache round trip.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Reads through the cache first and fills it on a miss.
///
/// The cache is optional and never authoritative: a disabled, failing or
/// slow cache turns every call into a plain delegation to `inner`.
pub struct CachedRepository<R> {
    inner: R,
    cache: Option<Arc<dyn KeyValueCache>>,
    timeout: Duration,
}

impl<R: AdminAreaRepository> CachedRepository<R> {
    pub fn new(inner: R, cache: Option<Arc<dyn KeyValueCache>>) -> Self {
        Self {
            inner,
            cache,
            timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = CacheResult<T>> + Send,
    ) -> CacheResult<T> {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let cache = self.cache.as_ref()?;

        let bytes = match self.bounded(cache.get(key.as_str())).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read for {} skipped: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!("Cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn write<T: Serialize + Sync>(&self, key: &CacheKey, value: &T) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };

        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not encode cache entry {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.bounded(cache.set(key.as_str(), bytes)).await {
            warn!("Cache write for {} skipped: {}", key, e);
        }
    }

    async fn read_through<T, F, Fut>(&self, key: CacheKey, load: F) -> LookupResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = LookupResult<T>> + Send,
    {
        if let Some(hit) = self.read(&key).await {
            return Ok(hit);
        }

        let value = load().await?;
        self.write(&key, &value).await;
        Ok(value)
    }
}

#[async_trait]
impl<R: AdminAreaRepository> AdminAreaRepository for CachedRepository<R> {
    async fn get_by_id(
        &self,
        id: i64,
        level: AdminLevel,
        tolerance: Tolerance,
    ) -> LookupResult<AdminArea> {
        self.read_through(CacheKey::by_id(level, id, tolerance), || {
            self.inner.get_by_id(id, level, tolerance)
        })
        .await
    }

    async fn get_by_code(
        &self,
        code: &AreaCode,
        tolerance: Tolerance,
    ) -> LookupResult<AdminArea> {
        self.read_through(CacheKey::by_code(code, tolerance), || {
            self.inner.get_by_code(code, tolerance)
        })
        .await
    }

    async fn list(&self, level: AdminLevel, tolerance: Tolerance) -> LookupResult<Vec<AdminArea>> {
        self.read_through(CacheKey::list(level, tolerance), || {
            self.inner.list(level, tolerance)
        })
        .await
    }

    async fn get_children(
        &self,
        parent: &AreaCode,
        child_level: AdminLevel,
        tolerance: Tolerance,
    ) -> LookupResult<Vec<AdminArea>> {
        validate_children(parent, child_level)?;

        self.read_through(CacheKey::children(parent, child_level, tolerance), || {
            self.inner.get_children(parent, child_level, tolerance)
        })
        .await
    }

    async fn filter_coordinates_by_boundary(
        &self,
        points: &[GeoPoint],
        boundary: &AreaCode,
    ) -> LookupResult<Vec<GeoPoint>> {
        self.inner
            .filter_coordinates_by_boundary(points, boundary)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::LookupError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and answers every lookup with the same country.
    #[derive(Default)]
    struct Fixed {
        calls: AtomicUsize,
    }

    fn thailand() -> AdminArea {
        AdminArea::new(
            7,
            "Thailand".to_string(),
            "THA".to_string(),
            AdminLevel::Country,
            None,
            serde_json::Value::Null,
        )
    }

    #[async_trait]
    impl AdminAreaRepository for Fixed {
        async fn get_by_id(&self, _: i64, _: AdminLevel, _: Tolerance) -> LookupResult<AdminArea> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(thailand())
        }

        async fn get_by_code(&self, _: &AreaCode, _: Tolerance) -> LookupResult<AdminArea> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(LookupError::NotFound {
                level: 0,
                key: "code ZZZ".to_string(),
            })
        }

        async fn list(&self, _: AdminLevel, _: Tolerance) -> LookupResult<Vec<AdminArea>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![thailand()])
        }

        async fn get_children(
            &self,
            _: &AreaCode,
            _: AdminLevel,
            _: Tolerance,
        ) -> LookupResult<Vec<AdminArea>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn filter_coordinates_by_boundary(
            &self,
            points: &[GeoPoint],
            _: &AreaCode,
        ) -> LookupResult<Vec<GeoPoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(points.to_vec())
        }
    }

    /// A cache that never answers in time.
    struct Stalled;

    #[async_trait]
    impl KeyValueCache for Stalled {
        async fn get(&self, _: &str) -> CacheResult<Option<Vec<u8>>> {
            std::future::pending().await
        }

        async fn set(&self, _: &str, _: Vec<u8>) -> CacheResult<()> {
            std::future::pending().await
        }

        async fn delete(&self, _: &str) -> CacheResult<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    fn calls(repo: &CachedRepository<Fixed>) -> usize {
        repo.inner().calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_second_read_is_a_hit() {
        let cache = Arc::new(MemoryCache::new());
        let repo = CachedRepository::new(Fixed::default(), Some(cache.clone()));

        let first = repo.get_by_id(7, AdminLevel::Country, Tolerance::Exact).await.unwrap();
        let second = repo.get_by_id(7, AdminLevel::Country, Tolerance::Exact).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls(&repo), 1);
        assert!(cache.get("admin_area:0:7:<nil>").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = Arc::new(MemoryCache::new());
        let repo = CachedRepository::new(Fixed::default(), Some(cache.clone()));
        let code = AreaCode::parse("ZZZ").unwrap();

        assert!(repo.get_by_code(&code, Tolerance::Exact).await.is_err());
        assert!(repo.get_by_code(&code, Tolerance::Exact).await.is_err());
        assert_eq!(calls(&repo), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_garbage_entry_is_a_miss() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set("admin_area:list:0:<nil>", b"not json".to_vec())
            .await
            .unwrap();
        let repo = CachedRepository::new(Fixed::default(), Some(cache.clone()));

        let areas = repo.list(AdminLevel::Country, Tolerance::Exact).await.unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(calls(&repo), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_delegates() {
        let repo = CachedRepository::new(Fixed::default(), None);
        repo.list(AdminLevel::Country, Tolerance::Exact).await.unwrap();
        repo.list(AdminLevel::Country, Tolerance::Exact).await.unwrap();
        assert_eq!(calls(&repo), 2);
    }

    #[tokio::test]
    async fn test_stalled_cache_degrades_to_pass_through() {
        let repo = CachedRepository::new(Fixed::default(), Some(Arc::new(Stalled)))
            .with_timeout(Duration::from_millis(10));
        let area = repo.get_by_id(7, AdminLevel::Country, Tolerance::Exact).await.unwrap();
        assert_eq!(area.code(), "THA");
        assert_eq!(calls(&repo), 1);
    }

    #[tokio::test]
    async fn test_children_validated_before_cache() {
        let repo = CachedRepository::new(Fixed::default(), Some(Arc::new(Stalled)))
            .with_timeout(Duration::from_secs(60));
        let tha = AreaCode::parse("THA").unwrap();
        let err = repo
            .get_children(&tha, AdminLevel::Country, Tolerance::Exact)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::InvalidLevel { .. }));
        assert_eq!(calls(&repo), 0);
    }

    #[tokio::test]
    async fn test_filter_is_never_cached() {
        let cache = Arc::new(MemoryCache::new());
        let repo = CachedRepository::new(Fixed::default(), Some(cache.clone()));
        let tha = AreaCode::parse("THA").unwrap();
        let points = [GeoPoint::new(13.7563, 100.5018)];

        repo.filter_coordinates_by_boundary(&points, &tha).await.unwrap();
        repo.filter_coordinates_by_boundary(&points, &tha).await.unwrap();
        assert_eq!(calls(&repo), 2);
        assert!(cache.is_empty().await);
    }
}
