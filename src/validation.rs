//! Request validation that must run before any cache or store round trip.

use crate::error::{Axis, LookupError, LookupResult};
use crate::models::{AdminLevel, AreaCode, GeoPoint};

/// Largest coordinate batch accepted by the boundary filter.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Check batch size, then each point in order; the first bad index wins.
pub fn validate_coordinates(points: &[GeoPoint]) -> LookupResult<()> {
    if points.is_empty() || points.len() > MAX_BATCH_SIZE {
        return Err(LookupError::EmptyOrOversizedBatch { len: points.len() });
    }

    for (index, point) in points.iter().enumerate() {
        if !(-90.0..=90.0).contains(&point.lat) {
            return Err(LookupError::InvalidCoordinate {
                index,
                axis: Axis::Latitude,
            });
        }
        if !(-180.0..=180.0).contains(&point.lon) {
            return Err(LookupError::InvalidCoordinate {
                index,
                axis: Axis::Longitude,
            });
        }
    }

    Ok(())
}

/// A children request needs a child level below the country and a parent
/// exactly one level above it.
pub fn validate_children(parent: &AreaCode, child_level: AdminLevel) -> LookupResult<()> {
    let Some(parent_level) = child_level.parent() else {
        return Err(LookupError::InvalidLevel {
            level: child_level.index() as i64,
            reason: "level 0 has no parent",
        });
    };

    if parent.level() != parent_level {
        return Err(LookupError::malformed(
            parent.as_str(),
            "parent code must sit one level above the child level",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize) -> Vec<GeoPoint> {
        vec![GeoPoint::new(0.0, 0.0); n]
    }

    #[test]
    fn test_batch_limits() {
        assert_eq!(
            validate_coordinates(&[]),
            Err(LookupError::EmptyOrOversizedBatch { len: 0 })
        );
        assert!(validate_coordinates(&batch(MAX_BATCH_SIZE)).is_ok());
        assert_eq!(
            validate_coordinates(&batch(MAX_BATCH_SIZE + 1)),
            Err(LookupError::EmptyOrOversizedBatch { len: 10_001 })
        );
    }

    #[test]
    fn test_boundary_values_accepted() {
        let points = [
            GeoPoint::new(90.0, 180.0),
            GeoPoint::new(-90.0, -180.0),
            GeoPoint::new(0.0, 0.0),
        ];
        assert!(validate_coordinates(&points).is_ok());
    }

    #[test]
    fn test_first_violation_reported_with_index() {
        let points = [
            GeoPoint::new(13.7563, 100.5018),
            GeoPoint::new(48.2082, 16.3738),
            GeoPoint::new(91.0, 100.5018),
        ];
        assert_eq!(
            validate_coordinates(&points),
            Err(LookupError::InvalidCoordinate {
                index: 2,
                axis: Axis::Latitude
            })
        );

        let points = [GeoPoint::new(0.0, 181.0), GeoPoint::new(-91.0, 0.0)];
        assert_eq!(
            validate_coordinates(&points),
            Err(LookupError::InvalidCoordinate {
                index: 0,
                axis: Axis::Longitude
            })
        );
    }

    #[test]
    fn test_nan_is_out_of_range() {
        let points = [GeoPoint::new(f64::NAN, 0.0)];
        assert!(matches!(
            validate_coordinates(&points),
            Err(LookupError::InvalidCoordinate { index: 0, .. })
        ));
    }

    #[test]
    fn test_children_levels() {
        let tha = AreaCode::parse("THA").unwrap();
        assert!(validate_children(&tha, AdminLevel::Region).is_ok());
        assert!(matches!(
            validate_children(&tha, AdminLevel::Country),
            Err(LookupError::InvalidLevel { level: 0, .. })
        ));
        assert!(matches!(
            validate_children(&tha, AdminLevel::District),
            Err(LookupError::MalformedCode { .. })
        ));
    }
}
