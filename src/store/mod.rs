//! Spatial store contract.
//!
//! The repository only talks to a store through [`SpatialStore`]: fetch rows
//! from a level's relation, test a batch of points against one boundary, and
//! check a boundary exists. Geometry work (containment, simplification) is
//! the store's job.

#[cfg(feature = "postgis")]
pub mod postgis;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::code::VERSION_SEPARATOR;
use crate::models::GeoPoint;
use crate::registry::LevelSchema;

#[cfg(feature = "postgis")]
pub use postgis::PostgisStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Adapter-level failure. Never shown to callers verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store query failed: {0}")]
    Query(String),

    #[error("malformed geometry payload for {code}: {reason}")]
    MalformedGeometry { code: String, reason: String },
}

/// How a code predicate matches the level's code column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeMatch {
    Exact(String),
    /// Anchored literal prefix
    Prefix(String),
    /// An unversioned code: the row carrying it exactly, or any `{code}_N`
    /// version of it. The exact row ranks first.
    Group(String),
}

impl CodeMatch {
    pub fn matches(&self, code: &str) -> bool {
        match self {
            CodeMatch::Exact(expected) => code == expected,
            CodeMatch::Prefix(prefix) => code.starts_with(prefix.as_str()),
            CodeMatch::Group(group) => code
                .strip_prefix(group.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(VERSION_SEPARATOR)),
        }
    }

    /// Code that ranks a matched row first when several rows match.
    pub fn literal(&self) -> Option<&str> {
        match self {
            CodeMatch::Exact(code) | CodeMatch::Group(code) => Some(code.as_str()),
            CodeMatch::Prefix(_) => None,
        }
    }

    /// SQL `LIKE` pattern (escape character `\`). Exact codes are escaped too,
    /// so the pattern never matches more than the literal. A group's pattern
    /// only covers its versions; the exact row is matched by equality.
    pub fn like_pattern(&self) -> String {
        match self {
            CodeMatch::Exact(code) => escape_like(code),
            CodeMatch::Prefix(prefix) => format!("{}%", escape_like(prefix)),
            CodeMatch::Group(group) => format!("{}\\{}%", escape_like(group), VERSION_SEPARATOR),
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 4);
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Id(i64),
    Code(CodeMatch),
}

/// One read against a level's relation.
#[derive(Debug, Clone)]
pub struct RowQuery {
    pub schema: &'static LevelSchema,
    pub predicate: Option<Predicate>,
    /// Topology-preserving simplification budget, `None` for exact geometry
    pub simplify: Option<f64>,
}

impl RowQuery {
    pub fn new(schema: &'static LevelSchema) -> Self {
        Self {
            schema,
            predicate: None,
            simplify: None,
        }
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_simplify(mut self, tolerance: Option<f64>) -> Self {
        self.simplify = tolerance;
        self
    }
}

/// A row as projected through the registry: level-agnostic column names,
/// geometry already rendered as GeoJSON.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRow {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub geometry: serde_json::Value,
}

#[async_trait]
pub trait SpatialStore: Send + Sync {
    /// First matching row. A row equal to the match's literal code ranks
    /// first, then the lowest id.
    async fn fetch_one(&self, query: &RowQuery) -> StoreResult<Option<LevelRow>>;

    /// All matching rows ordered by the schema's `order_by`, then id.
    async fn fetch_all(&self, query: &RowQuery) -> StoreResult<Vec<LevelRow>>;

    /// Ascending indexes of `points` inside the boundary `code` resolves to,
    /// picked with the same ranking as [`SpatialStore::fetch_one`].
    /// An unknown boundary yields an empty result, not an error.
    async fn points_within(
        &self,
        schema: &'static LevelSchema,
        code: &CodeMatch,
        points: &[GeoPoint],
    ) -> StoreResult<Vec<usize>>;

    async fn boundary_exists(
        &self,
        schema: &'static LevelSchema,
        code: &CodeMatch,
    ) -> StoreResult<bool>;

    /// Cheap liveness check used by the health route.
    async fn ping(&self) -> StoreResult<()>;

    fn name(&self) -> &'static str;
}
