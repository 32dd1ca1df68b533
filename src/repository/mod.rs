//! Admin area repositories.
//!
//! [`SpatialRepository`] resolves every request through the level registry
//! against a [`SpatialStore`](crate::store::SpatialStore).
//! [`CachedRepository`] wraps any repository with cache-aside reads.

pub mod cache_key;
mod cached;
mod spatial;

use async_trait::async_trait;

use crate::error::LookupResult;
use crate::models::{AdminArea, AdminLevel, AreaCode, GeoPoint, Tolerance};

pub use cache_key::CacheKey;
pub use cached::CachedRepository;
pub use spatial::SpatialRepository;

#[async_trait]
pub trait AdminAreaRepository: Send + Sync {
    async fn get_by_id(
        &self,
        id: i64,
        level: AdminLevel,
        tolerance: Tolerance,
    ) -> LookupResult<AdminArea>;

    /// Look up an area by code at the code's own level.
    ///
    /// Codes without a version suffix at levels 1 and deeper match the row
    /// stored under that exact code, or else any versioned code in their
    /// group (`THA.3` finds `THA.3_1`). The exact row wins, then the lowest id.
    async fn get_by_code(&self, code: &AreaCode, tolerance: Tolerance)
        -> LookupResult<AdminArea>;

    async fn list(&self, level: AdminLevel, tolerance: Tolerance) -> LookupResult<Vec<AdminArea>>;

    async fn get_children(
        &self,
        parent: &AreaCode,
        child_level: AdminLevel,
        tolerance: Tolerance,
    ) -> LookupResult<Vec<AdminArea>>;

    /// Points of `points` inside `boundary`, in input order.
    ///
    /// The boundary resolves by the same rule as
    /// [`get_by_code`](Self::get_by_code), so `THA.3` filters against the
    /// area `get_by_code` would return for it.
    async fn filter_coordinates_by_boundary(
        &self,
        points: &[GeoPoint],
        boundary: &AreaCode,
    ) -> LookupResult<Vec<GeoPoint>>;
}
