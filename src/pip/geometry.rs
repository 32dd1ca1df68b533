//! GeoJSON polygon payloads and their `geo` counterparts.

use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// GeoJSON position; anything past the second ordinate (altitude) is ignored.
pub type Position = Vec<f64>;

/// The polygonal subset of GeoJSON geometry objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("position has fewer than two ordinates")]
    ShortPosition,
    #[error("polygon has no exterior ring")]
    MissingExterior,
}

impl GeoJsonGeometry {
    pub fn to_multi_polygon(&self) -> Result<MultiPolygon<f64>, GeometryError> {
        let polygons = match self {
            GeoJsonGeometry::Polygon { coordinates } => vec![polygon_from_rings(coordinates)?],
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|rings| polygon_from_rings(rings))
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(MultiPolygon::new(polygons))
    }

    pub fn from_multi_polygon(geometry: &MultiPolygon<f64>) -> Self {
        let coordinates = geometry
            .iter()
            .map(|polygon| {
                std::iter::once(polygon.exterior())
                    .chain(polygon.interiors())
                    .map(ring_positions)
                    .collect()
            })
            .collect();
        GeoJsonGeometry::MultiPolygon { coordinates }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn polygon_from_rings(rings: &[Vec<Position>]) -> Result<Polygon<f64>, GeometryError> {
    let (exterior, interiors) = rings.split_first().ok_or(GeometryError::MissingExterior)?;
    let interiors = interiors
        .iter()
        .map(|ring| ring_from_positions(ring))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(ring_from_positions(exterior)?, interiors))
}

fn ring_from_positions(positions: &[Position]) -> Result<LineString<f64>, GeometryError> {
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(GeometryError::ShortPosition),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn ring_positions(ring: &LineString<f64>) -> Vec<Position> {
    ring.coords().map(|c| vec![c.x, c.y]).collect()
}
