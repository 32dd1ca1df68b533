#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use geo::{polygon, MultiPolygon};

use cypress_boundaries::models::{AdminLevel, GeoPoint};
use cypress_boundaries::pip::{AdminBoundary, MemoryStore};
use cypress_boundaries::registry::LevelSchema;
use cypress_boundaries::store::{CodeMatch, LevelRow, RowQuery, SpatialStore, StoreResult};

pub const BANGKOK: GeoPoint = GeoPoint {
    lat: 13.7563,
    lon: 100.5018,
};

pub const VIENNA: GeoPoint = GeoPoint {
    lat: 48.2082,
    lon: 16.3738,
};

fn rect(id: i64, level: AdminLevel, code: &str, name: &str, bounds: [f64; 4]) -> AdminBoundary {
    let [min_lon, min_lat, max_lon, max_lat] = bounds;
    AdminBoundary {
        id,
        level,
        code: code.to_string(),
        name: name.to_string(),
        geometry: MultiPolygon::new(vec![polygon![
            (x: min_lon, y: min_lat),
            (x: max_lon, y: min_lat),
            (x: max_lon, y: max_lat),
            (x: min_lon, y: max_lat),
        ]]),
    }
}

/// Thailand and Austria with one chain of descendants down to level 4.
/// `AUT.1` is stored both unversioned and as `AUT.1_1`.
pub fn boundaries() -> Vec<AdminBoundary> {
    use AdminLevel::*;
    vec![
        rect(7, Country, "THA", "Thailand", [97.0, 5.0, 106.0, 21.0]),
        rect(3, Country, "AUT", "Austria", [9.0, 46.3, 17.2, 49.1]),
        rect(11, Region, "THA.1_1", "Bangkok", [100.3, 13.5, 100.9, 14.0]),
        rect(13, Region, "THA.3_1", "Chachoengsao", [101.0, 13.0, 102.0, 14.0]),
        rect(14, Region, "THA.3_2", "Chachoengsao", [101.0, 13.0, 102.0, 14.0]),
        rect(21, Region, "AUT.1_1", "Burgenland", [16.0, 46.8, 17.2, 48.1]),
        rect(22, Region, "AUT.1", "Burgenland", [16.0, 46.8, 17.2, 48.1]),
        rect(29, Region, "AUT.9_1", "Wien", [16.18, 48.11, 16.58, 48.33]),
        rect(31, District, "AUT.9.1_1", "Wien", [16.18, 48.11, 16.58, 48.33]),
        rect(41, Municipality, "AUT.9.1.1_1", "Innere Stadt", [16.35, 48.19, 16.39, 48.22]),
        rect(51, Locality, "AUT.9.1.1.1_1", "Stephansdom", [16.37, 48.20, 16.38, 48.21]),
    ]
}

pub fn memory_store() -> MemoryStore {
    MemoryStore::from_boundaries(boundaries())
}

/// Store wrapper counting every round trip.
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: memory_store(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpatialStore for CountingStore {
    async fn fetch_one(&self, query: &RowQuery) -> StoreResult<Option<LevelRow>> {
        self.hit();
        self.inner.fetch_one(query).await
    }

    async fn fetch_all(&self, query: &RowQuery) -> StoreResult<Vec<LevelRow>> {
        self.hit();
        self.inner.fetch_all(query).await
    }

    async fn points_within(
        &self,
        schema: &'static LevelSchema,
        code: &CodeMatch,
        points: &[GeoPoint],
    ) -> StoreResult<Vec<usize>> {
        self.hit();
        self.inner.points_within(schema, code, points).await
    }

    async fn boundary_exists(
        &self,
        schema: &'static LevelSchema,
        code: &CodeMatch,
    ) -> StoreResult<bool> {
        self.hit();
        self.inner.boundary_exists(schema, code).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}
