//! Per-level boundary table and batch point-in-polygon tests.

use geo::{Contains, Point};
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use std::sync::Arc;
use tracing::info;

use super::AdminBoundary;
use crate::models::{AdminLevel, GeoPoint};
use crate::store::CodeMatch;

/// Boundaries grouped by level, each group sorted by id.
pub struct BoundaryTable {
    by_level: [Vec<Arc<AdminBoundary>>; 5],
}

impl BoundaryTable {
    /// Build the table from loaded boundaries
    pub fn build(boundaries: Vec<AdminBoundary>) -> Self {
        info!("Building boundary table for {} boundaries...", boundaries.len());

        let mut by_level: [Vec<Arc<AdminBoundary>>; 5] = Default::default();
        for boundary in boundaries {
            by_level[boundary.level.index() as usize].push(Arc::new(boundary));
        }
        for bounds in &mut by_level {
            bounds.sort_by_key(|b| b.id);
        }

        for level in AdminLevel::all() {
            info!(
                "  {:?}: {} boundaries",
                level,
                by_level[level.index() as usize].len()
            );
        }

        Self { by_level }
    }

    /// All boundaries at a level, lowest id first
    pub fn at_level(&self, level: AdminLevel) -> &[Arc<AdminBoundary>] {
        &self.by_level[level.index() as usize]
    }

    /// Best boundary at `level` for `code`: one carrying the match's literal
    /// code if any, otherwise the lowest id among the matches.
    pub fn find(&self, level: AdminLevel, code: &CodeMatch) -> Option<&Arc<AdminBoundary>> {
        let literal = code.literal();
        self.at_level(level)
            .iter()
            .filter(|b| code.matches(&b.code))
            .min_by_key(|b| (literal != Some(b.code.as_str()), b.id))
    }

    /// Get total number of boundaries
    pub fn len(&self) -> usize {
        self.by_level.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Ascending indexes of the points inside `boundary`.
///
/// The batch goes into an R-tree so only points within the boundary's
/// bounding box reach the exact containment test.
pub fn points_within(boundary: &AdminBoundary, points: &[GeoPoint]) -> Vec<usize> {
    let Some((min_x, min_y, max_x, max_y)) = boundary.bbox() else {
        return Vec::new();
    };

    let tree: RTree<IndexedPoint> = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new([p.lon, p.lat], i))
            .collect(),
    );

    let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
    let mut inside: Vec<usize> = tree
        .locate_in_envelope(&envelope)
        .filter(|candidate| {
            let [x, y] = *candidate.geom();
            boundary.geometry.contains(&Point::new(x, y))
        })
        .map(|candidate| candidate.data)
        .collect();

    inside.sort_unstable();
    inside
}
