//! Administrative hierarchy types.

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// Depth in the GADM-style administrative hierarchy.
///
/// Serialized as the bare integer (`0` = country).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(try_from = "i64", into = "u8")]
pub enum AdminLevel {
    /// Country (level 0)
    Country,
    /// State / province (level 1)
    Region,
    /// District / county (level 2)
    District,
    /// Municipality / sub-district (level 3)
    Municipality,
    /// Locality / ward (level 4)
    Locality,
}

impl AdminLevel {
    /// Convert a raw level number to AdminLevel
    pub fn from_index(level: i64) -> Result<Self, LookupError> {
        match level {
            0 => Ok(AdminLevel::Country),
            1 => Ok(AdminLevel::Region),
            2 => Ok(AdminLevel::District),
            3 => Ok(AdminLevel::Municipality),
            4 => Ok(AdminLevel::Locality),
            _ => Err(LookupError::InvalidLevel {
                level,
                reason: "must be between 0 and 4",
            }),
        }
    }

    /// Get the level number
    pub fn index(&self) -> u8 {
        match self {
            AdminLevel::Country => 0,
            AdminLevel::Region => 1,
            AdminLevel::District => 2,
            AdminLevel::Municipality => 3,
            AdminLevel::Locality => 4,
        }
    }

    /// Get all admin levels in hierarchical order (country first)
    pub fn all() -> &'static [AdminLevel] {
        &[
            AdminLevel::Country,
            AdminLevel::Region,
            AdminLevel::District,
            AdminLevel::Municipality,
            AdminLevel::Locality,
        ]
    }

    /// The enclosing level, `None` for countries.
    pub fn parent(&self) -> Option<AdminLevel> {
        match self {
            AdminLevel::Country => None,
            other => AdminLevel::from_index(other.index() as i64 - 1).ok(),
        }
    }

    /// The next finer level, `None` below localities.
    pub fn child(&self) -> Option<AdminLevel> {
        AdminLevel::from_index(self.index() as i64 + 1).ok()
    }
}

impl TryFrom<i64> for AdminLevel {
    type Error = LookupError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        AdminLevel::from_index(value)
    }
}

impl From<AdminLevel> for u8 {
    fn from(level: AdminLevel) -> Self {
        level.index()
    }
}

impl std::fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// An administrative area as returned to callers.
///
/// Built once by the mapper (or decoded from the cache) and never modified
/// afterwards; a re-fetch yields a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminArea {
    id: i64,
    name: String,
    code: String,
    level: AdminLevel,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    parent_code: Option<String>,
    /// GeoJSON geometry object
    geometry: serde_json::Value,
}

impl AdminArea {
    pub(crate) fn new(
        id: i64,
        name: String,
        code: String,
        level: AdminLevel,
        parent_code: Option<String>,
        geometry: serde_json::Value,
    ) -> Self {
        Self {
            id,
            name,
            code,
            level,
            parent_code,
            geometry,
        }
    }

    /// Store-local identifier, unique within its level
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted hierarchical code, e.g. `AUT.1.4_1`
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn level(&self) -> AdminLevel {
        self.level
    }

    /// Code of the enclosing area, absent for countries
    pub fn parent_code(&self) -> Option<&str> {
        self.parent_code.as_deref()
    }

    pub fn geometry(&self) -> &serde_json::Value {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bounds() {
        for (i, level) in AdminLevel::all().iter().enumerate() {
            assert_eq!(AdminLevel::from_index(i as i64).unwrap(), *level);
            assert_eq!(level.index() as usize, i);
        }
        assert!(matches!(
            AdminLevel::from_index(5),
            Err(LookupError::InvalidLevel { level: 5, .. })
        ));
        assert!(AdminLevel::from_index(-1).is_err());
    }

    #[test]
    fn test_parent_and_child() {
        assert_eq!(AdminLevel::Country.parent(), None);
        assert_eq!(AdminLevel::Region.parent(), Some(AdminLevel::Country));
        assert_eq!(AdminLevel::Municipality.child(), Some(AdminLevel::Locality));
        assert_eq!(AdminLevel::Locality.child(), None);
    }

    #[test]
    fn test_level_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&AdminLevel::District).unwrap(), "2");
        let level: AdminLevel = serde_json::from_str("4").unwrap();
        assert_eq!(level, AdminLevel::Locality);
        assert!(serde_json::from_str::<AdminLevel>("7").is_err());
    }

    #[test]
    fn test_area_json_shape() {
        let area = AdminArea::new(
            1,
            "Thailand".to_string(),
            "THA".to_string(),
            AdminLevel::Country,
            None,
            serde_json::json!({"type": "MultiPolygon", "coordinates": []}),
        );
        let value = serde_json::to_value(&area).unwrap();
        assert_eq!(value["code"], "THA");
        assert_eq!(value["level"], 0);
        assert!(value.get("parent_code").is_none());

        let back: AdminArea = serde_json::from_value(value).unwrap();
        assert_eq!(back, area);
    }
}
