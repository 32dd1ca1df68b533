//! In-memory [`SpatialStore`] backed by a [`BoundaryTable`].

use async_trait::async_trait;
use geo::SimplifyVwPreserve;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::geometry::GeoJsonGeometry;
use super::index::points_within;
use super::{load_boundaries, AdminBoundary, BoundaryTable};
use crate::models::GeoPoint;
use crate::registry::LevelSchema;
use crate::store::{CodeMatch, LevelRow, Predicate, RowQuery, SpatialStore, StoreResult};

/// Serves every level from boundaries held in process memory.
pub struct MemoryStore {
    table: BoundaryTable,
}

impl MemoryStore {
    pub fn new(table: BoundaryTable) -> Self {
        Self { table }
    }

    pub fn from_boundaries(boundaries: Vec<AdminBoundary>) -> Self {
        Self::new(BoundaryTable::build(boundaries))
    }

    /// Load a GeoJSON boundary export and index it.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self::from_boundaries(load_boundaries(path)?))
    }

    pub fn table(&self) -> &BoundaryTable {
        &self.table
    }

    fn matching<'a>(
        &'a self,
        query: &'a RowQuery,
    ) -> impl Iterator<Item = &'a Arc<AdminBoundary>> + 'a {
        self.table
            .at_level(query.schema.level)
            .iter()
            .filter(move |b| match &query.predicate {
                None => true,
                Some(Predicate::Id(id)) => b.id == *id,
                Some(Predicate::Code(m)) => m.matches(&b.code),
            })
    }
}

fn render(boundary: &AdminBoundary, simplify: Option<f64>) -> LevelRow {
    let geometry = match simplify {
        Some(epsilon) => boundary.geometry.simplify_vw_preserve(epsilon),
        None => boundary.geometry.clone(),
    };

    LevelRow {
        id: boundary.id,
        name: boundary.name.clone(),
        code: boundary.code.clone(),
        geometry: GeoJsonGeometry::from_multi_polygon(&geometry).to_value(),
    }
}

#[async_trait]
impl SpatialStore for MemoryStore {
    async fn fetch_one(&self, query: &RowQuery) -> StoreResult<Option<LevelRow>> {
        let found = match &query.predicate {
            Some(Predicate::Code(code)) => self.table.find(query.schema.level, code),
            // Each level is kept sorted by id, so the first match is the lowest id
            _ => self.matching(query).next(),
        };
        Ok(found.map(|b| render(b, query.simplify)))
    }

    async fn fetch_all(&self, query: &RowQuery) -> StoreResult<Vec<LevelRow>> {
        let mut matched: Vec<&Arc<AdminBoundary>> = self.matching(query).collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        debug!(
            "Memory store: {} rows from {}",
            matched.len(),
            query.schema.relation
        );

        Ok(matched
            .into_iter()
            .map(|b| render(b, query.simplify))
            .collect())
    }

    async fn points_within(
        &self,
        schema: &'static LevelSchema,
        code: &CodeMatch,
        points: &[GeoPoint],
    ) -> StoreResult<Vec<usize>> {
        Ok(self
            .table
            .find(schema.level, code)
            .map(|boundary| points_within(boundary, points))
            .unwrap_or_default())
    }

    async fn boundary_exists(
        &self,
        schema: &'static LevelSchema,
        code: &CodeMatch,
    ) -> StoreResult<bool> {
        Ok(self.table.find(schema.level, code).is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdminLevel;
    use crate::registry;
    use geo::{polygon, MultiPolygon};

    fn square(id: i64, level: AdminLevel, code: &str, name: &str, x0: f64) -> AdminBoundary {
        AdminBoundary {
            id,
            level,
            code: code.to_string(),
            name: name.to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x0, y: 0.0),
                (x: x0 + 1.0, y: 0.0),
                (x: x0 + 1.0, y: 1.0),
                (x: x0 + 0.5, y: 1.001),
                (x: x0, y: 1.0),
            ]]),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::from_boundaries(vec![
            square(4, AdminLevel::Region, "THA.3_1", "Chachoengsao", 0.0),
            square(2, AdminLevel::Region, "THA.3_1", "Chachoengsao", 0.0),
            square(3, AdminLevel::Region, "THA.1_1", "Amnat Charoen", 2.0),
            square(1, AdminLevel::Country, "THA", "Thailand", 0.0),
            square(6, AdminLevel::Region, "THA.1", "Amnat Charoen", 4.0),
        ])
    }

    #[tokio::test]
    async fn test_prefix_lookup_takes_lowest_id() {
        let store = store();
        let query = RowQuery::new(registry::resolve(AdminLevel::Region))
            .with_predicate(Predicate::Code(CodeMatch::Prefix("THA.3_".to_string())));
        let row = store.fetch_one(&query).await.unwrap().unwrap();
        assert_eq!(row.id, 2);
        assert_eq!(row.geometry["type"], "MultiPolygon");
    }

    #[tokio::test]
    async fn test_group_lookup_prefers_the_plain_row() {
        let store = store();
        let schema = registry::resolve(AdminLevel::Region);

        let plain = RowQuery::new(schema)
            .with_predicate(Predicate::Code(CodeMatch::Group("THA.1".to_string())));
        let row = store.fetch_one(&plain).await.unwrap().unwrap();
        assert_eq!((row.id, row.code.as_str()), (6, "THA.1"));

        let versioned = RowQuery::new(schema)
            .with_predicate(Predicate::Code(CodeMatch::Group("THA.3".to_string())));
        assert_eq!(store.fetch_one(&versioned).await.unwrap().unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_fetch_all_orders_by_name_then_id() {
        let store = store();
        let query = RowQuery::new(registry::resolve(AdminLevel::Region));
        let ids: Vec<i64> = store
            .fetch_all(&query)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![3, 6, 2, 4]);
    }

    #[tokio::test]
    async fn test_simplification_drops_vertices() {
        let store = store();
        let schema = registry::resolve(AdminLevel::Country);
        let exact = store
            .fetch_one(&RowQuery::new(schema).with_predicate(Predicate::Id(1)))
            .await
            .unwrap()
            .unwrap();
        let simplified = store
            .fetch_one(
                &RowQuery::new(schema)
                    .with_predicate(Predicate::Id(1))
                    .with_simplify(Some(0.01)),
            )
            .await
            .unwrap()
            .unwrap();

        let ring_len = |row: &LevelRow| row.geometry["coordinates"][0][0].as_array().unwrap().len();
        assert!(ring_len(&simplified) < ring_len(&exact));
    }

    #[tokio::test]
    async fn test_unknown_boundary() {
        let store = store();
        let schema = registry::resolve(AdminLevel::Country);
        let points = [GeoPoint::new(0.5, 0.5)];
        let zzz = CodeMatch::Exact("ZZZ".to_string());
        let tha = CodeMatch::Exact("THA".to_string());
        assert!(store.points_within(schema, &zzz, &points).await.unwrap().is_empty());
        assert!(!store.boundary_exists(schema, &zzz).await.unwrap());
        assert_eq!(store.points_within(schema, &tha, &points).await.unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_group_boundary_resolves_like_fetch_one() {
        let store = store();
        let schema = registry::resolve(AdminLevel::Region);
        let group = CodeMatch::Group("THA.3".to_string());
        let points = [GeoPoint::new(0.5, 0.5), GeoPoint::new(2.5, 0.5)];
        assert!(store.boundary_exists(schema, &group).await.unwrap());
        assert_eq!(store.points_within(schema, &group, &points).await.unwrap(), vec![0]);
    }
}
