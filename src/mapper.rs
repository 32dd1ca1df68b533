//! Store rows to domain entities.

use crate::models::code::parent_of;
use crate::models::{AdminArea, AdminLevel};
use crate::store::LevelRow;

/// Conversion from a level-agnostic row into an [`AdminArea`].
///
/// The row itself does not know its level; the caller passes the level of
/// the schema that produced it.
pub trait IntoAdminArea {
    fn into_admin_area(self, level: AdminLevel) -> AdminArea;
}

impl IntoAdminArea for LevelRow {
    fn into_admin_area(self, level: AdminLevel) -> AdminArea {
        let parent_code = match level {
            AdminLevel::Country => None,
            _ => parent_of(&self.code).map(str::to_string),
        };

        AdminArea::new(
            self.id,
            self.name,
            self.code,
            level,
            parent_code,
            self.geometry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str) -> LevelRow {
        LevelRow {
            id: 12,
            name: "Wien".to_string(),
            code: code.to_string(),
            geometry: serde_json::json!({"type": "MultiPolygon", "coordinates": []}),
        }
    }

    #[test]
    fn test_country_has_no_parent() {
        let area = row("AUT").into_admin_area(AdminLevel::Country);
        assert_eq!(area.parent_code(), None);
        assert_eq!(area.level(), AdminLevel::Country);
    }

    #[test]
    fn test_parent_is_truncated_code() {
        let area = row("AUT.9.1_1").into_admin_area(AdminLevel::District);
        assert_eq!(area.id(), 12);
        assert_eq!(area.name(), "Wien");
        assert_eq!(area.code(), "AUT.9.1_1");
        assert_eq!(area.parent_code(), Some("AUT.9"));
        assert_eq!(area.geometry()["type"], "MultiPolygon");
    }
}
