//! Registry-driven repository over a spatial store.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use super::AdminAreaRepository;
use crate::error::{LookupError, LookupResult};
use crate::mapper::IntoAdminArea;
use crate::models::code::SEGMENT_SEPARATOR;
use crate::models::{AdminArea, AdminLevel, AreaCode, GeoPoint, Tolerance};
use crate::registry;
use crate::store::{CodeMatch, Predicate, RowQuery, SpatialStore, StoreError};
use crate::validation::{validate_children, validate_coordinates};

/// One code path for all five levels: the level picks a schema from the
/// registry and the schema shapes the store query.
#[derive(Clone)]
pub struct SpatialRepository {
    store: Arc<dyn SpatialStore>,
}

impl SpatialRepository {
    pub fn new(store: Arc<dyn SpatialStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SpatialStore> {
        &self.store
    }
}

fn unavailable(operation: &'static str) -> impl FnOnce(StoreError) -> LookupError {
    move |e| {
        error!("{} failed on spatial store: {}", operation, e);
        LookupError::StoreUnavailable
    }
}

/// Leaf codes name a row. Any other code names its own row, if stored
/// unversioned, or else the group of its versions.
fn code_match(code: &AreaCode) -> CodeMatch {
    if code.is_leaf() {
        CodeMatch::Exact(code.as_str().to_string())
    } else {
        CodeMatch::Group(code.as_str().to_string())
    }
}

#[async_trait]
impl AdminAreaRepository for SpatialRepository {
    async fn get_by_id(
        &self,
        id: i64,
        level: AdminLevel,
        tolerance: Tolerance,
    ) -> LookupResult<AdminArea> {
        let query = RowQuery::new(registry::resolve(level))
            .with_predicate(Predicate::Id(id))
            .with_simplify(tolerance.value());

        match self.store.fetch_one(&query).await.map_err(unavailable("get_by_id"))? {
            Some(row) => Ok(row.into_admin_area(level)),
            None => Err(LookupError::NotFound {
                level: level.index(),
                key: format!("id {}", id),
            }),
        }
    }

    async fn get_by_code(
        &self,
        code: &AreaCode,
        tolerance: Tolerance,
    ) -> LookupResult<AdminArea> {
        let level = code.level();
        let query = RowQuery::new(registry::resolve(level))
            .with_predicate(Predicate::Code(code_match(code)))
            .with_simplify(tolerance.value());

        debug!("Looking up {} at level {}", code, level);

        match self.store.fetch_one(&query).await.map_err(unavailable("get_by_code"))? {
            Some(row) => Ok(row.into_admin_area(level)),
            None => Err(LookupError::NotFound {
                level: level.index(),
                key: format!("code {}", code),
            }),
        }
    }

    async fn list(&self, level: AdminLevel, tolerance: Tolerance) -> LookupResult<Vec<AdminArea>> {
        let query = RowQuery::new(registry::resolve(level)).with_simplify(tolerance.value());

        let rows = self.store.fetch_all(&query).await.map_err(unavailable("list"))?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_admin_area(level))
            .collect())
    }

    async fn get_children(
        &self,
        parent: &AreaCode,
        child_level: AdminLevel,
        tolerance: Tolerance,
    ) -> LookupResult<Vec<AdminArea>> {
        validate_children(parent, child_level)?;

        let prefix = format!("{}{}", parent.group(), SEGMENT_SEPARATOR);
        let query = RowQuery::new(registry::resolve(child_level))
            .with_predicate(Predicate::Code(CodeMatch::Prefix(prefix)))
            .with_simplify(tolerance.value());

        let rows = self
            .store
            .fetch_all(&query)
            .await
            .map_err(unavailable("get_children"))?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_admin_area(child_level))
            .collect())
    }

    async fn filter_coordinates_by_boundary(
        &self,
        points: &[GeoPoint],
        boundary: &AreaCode,
    ) -> LookupResult<Vec<GeoPoint>> {
        validate_coordinates(points)?;

        let schema = registry::resolve(boundary.level());
        let target = code_match(boundary);
        let inside = self
            .store
            .points_within(schema, &target, points)
            .await
            .map_err(unavailable("points_within"))?;

        if inside.is_empty() {
            let exists = self
                .store
                .boundary_exists(schema, &target)
                .await
                .map_err(unavailable("boundary_exists"))?;
            if !exists {
                return Err(LookupError::BoundaryNotFound {
                    code: boundary.as_str().to_string(),
                });
            }
        }

        debug!(
            "{} of {} points inside {}",
            inside.len(),
            points.len(),
            boundary
        );

        Ok(inside
            .into_iter()
            .filter_map(|i| points.get(i).copied())
            .collect())
    }
}
