//! Level registry: which relation and columns back each admin level.
//!
//! The five GADM relations share a shape but not column names. Every
//! repository operation goes through this table instead of branching per
//! level, so one code path serves all of them.

use crate::error::LookupResult;
use crate::models::AdminLevel;

/// Query shape for one admin level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSchema {
    pub level: AdminLevel,
    /// Relation holding the level's rows
    pub relation: &'static str,
    pub id_column: &'static str,
    pub name_column: &'static str,
    /// Column holding the dotted code for this level (`gid_N`)
    pub code_column: &'static str,
    /// Ordering key for `list` and `children`
    pub order_by: &'static str,
    pub geometry_column: &'static str,
}

static LEVELS: [LevelSchema; 5] = [
    LevelSchema {
        level: AdminLevel::Country,
        relation: "admin0",
        id_column: "ogc_fid",
        name_column: "country",
        code_column: "gid_0",
        order_by: "country",
        geometry_column: "geom",
    },
    LevelSchema {
        level: AdminLevel::Region,
        relation: "admin1",
        id_column: "ogc_fid",
        name_column: "name_1",
        code_column: "gid_1",
        order_by: "name_1",
        geometry_column: "geom",
    },
    LevelSchema {
        level: AdminLevel::District,
        relation: "admin2",
        id_column: "ogc_fid",
        name_column: "name_2",
        code_column: "gid_2",
        order_by: "name_2",
        geometry_column: "geom",
    },
    LevelSchema {
        level: AdminLevel::Municipality,
        relation: "admin3",
        id_column: "ogc_fid",
        name_column: "name_3",
        code_column: "gid_3",
        order_by: "name_3",
        geometry_column: "geom",
    },
    LevelSchema {
        level: AdminLevel::Locality,
        relation: "admin4",
        id_column: "ogc_fid",
        name_column: "name_4",
        code_column: "gid_4",
        order_by: "name_4",
        geometry_column: "geom",
    },
];

/// Schema for a level.
pub fn resolve(level: AdminLevel) -> &'static LevelSchema {
    &LEVELS[level.index() as usize]
}

/// Schema for a raw level number; fails with `InvalidLevel` outside 0..=4.
pub fn resolve_index(level: i64) -> LookupResult<&'static LevelSchema> {
    AdminLevel::from_index(level).map(resolve)
}

/// All schemas, country first.
pub fn all() -> &'static [LevelSchema] {
    &LEVELS
}
