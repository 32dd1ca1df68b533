//! Admin boundary loading from GeoJSON exports.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geo::MultiPolygon;
use hashbrown::HashSet;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::geometry::GeoJsonGeometry;
use crate::models::{AdminLevel, AreaCode};
use crate::registry::{self, LevelSchema};

/// A single admin boundary polygon with metadata
#[derive(Debug, Clone)]
pub struct AdminBoundary {
    pub id: i64,
    pub level: AdminLevel,
    pub code: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl AdminBoundary {
    /// Get the bounding box of this boundary
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        use geo::BoundingRect;
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    geometry: Option<serde_json::Value>,
}

/// Load admin boundaries from a GeoJSON file
pub fn load_boundaries<P: AsRef<Path>>(path: P) -> Result<Vec<AdminBoundary>> {
    let path = path.as_ref();
    info!("Loading admin boundaries from {}", path.display());
    let content = fs::read_to_string(path).context("Failed to read boundaries file")?;
    parse_boundaries(&content)
}

/// Parse a GeoJSON `FeatureCollection` exported from the GADM relations.
///
/// Properties use the relation column names (`ogc_fid`, `gid_N`, `country`,
/// `name_N`). A feature belongs to the deepest level whose code column it
/// carries. Features without a usable code or polygonal geometry are skipped.
pub fn parse_boundaries(content: &str) -> Result<Vec<AdminBoundary>> {
    let collection: FeatureCollection =
        serde_json::from_str(content).context("Failed to parse GeoJSON feature collection")?;

    let mut boundaries = Vec::new();
    let mut unnumbered = Vec::new();
    let mut seen: [HashSet<i64>; 5] = Default::default();

    for feature in collection.features {
        let Some((schema, code)) = deepest_code(&feature.properties) else {
            debug!("Skipping feature without an admin code");
            continue;
        };

        if let Err(e) = AreaCode::parse_at(&code, schema.level) {
            debug!("Skipping feature: {}", e);
            continue;
        }

        let geometry = match feature
            .geometry
            .and_then(|g| serde_json::from_value::<GeoJsonGeometry>(g).ok())
            .map(|g| g.to_multi_polygon())
        {
            Some(Ok(geometry)) => geometry,
            _ => {
                debug!("Could not resolve polygon geometry for {}", code);
                continue;
            }
        };

        let id = feature_id(&feature.properties, schema, feature.id.as_ref());
        if let Some(id) = id {
            if !seen[schema.level.index() as usize].insert(id) {
                warn!("Skipping {}: duplicate id {} at {:?}", code, id, schema.level);
                continue;
            }
        }

        let name = feature
            .properties
            .get(schema.name_column)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let boundary = AdminBoundary {
            id: id.unwrap_or_default(),
            level: schema.level,
            code,
            name,
            geometry,
        };
        match id {
            Some(_) => boundaries.push(boundary),
            None => unnumbered.push(boundary),
        }
    }

    // Features without an id are numbered after every explicit id of their level
    let mut next_id = seen.each_ref().map(|ids| ids.iter().copied().max().unwrap_or(0));
    for mut boundary in unnumbered {
        let slot = &mut next_id[boundary.level.index() as usize];
        *slot += 1;
        boundary.id = *slot;
        boundaries.push(boundary);
    }

    info!("Found {} admin boundaries", boundaries.len());

    // Sort by admin level (country first)
    boundaries.sort_by(|a, b| a.level.cmp(&b.level).then(a.id.cmp(&b.id)));

    Ok(boundaries)
}

fn deepest_code(
    properties: &serde_json::Map<String, serde_json::Value>,
) -> Option<(&'static LevelSchema, String)> {
    registry::all().iter().rev().find_map(|schema| {
        properties
            .get(schema.code_column)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| (schema, s.to_string()))
    })
}

fn feature_id(
    properties: &serde_json::Map<String, serde_json::Value>,
    schema: &LevelSchema,
    fallback: Option<&serde_json::Value>,
) -> Option<i64> {
    properties
        .get(schema.id_column)
        .or(fallback)
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
}
