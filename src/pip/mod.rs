//! In-memory spatial engine.
//!
//! Loads admin boundaries from a GeoJSON export and answers store queries
//! with `geo` predicates, using an R-tree for batch point-in-polygon.

mod boundary;
pub mod geometry;
mod index;
mod store;

pub use boundary::{load_boundaries, parse_boundaries, AdminBoundary};
pub use index::{points_within, BoundaryTable};
pub use store::MemoryStore;
