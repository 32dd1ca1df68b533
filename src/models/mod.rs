//! Core data models for the boundary lookup service.

pub mod admin;
pub mod code;
pub mod point;
pub mod tolerance;

pub use admin::{AdminArea, AdminLevel};
pub use code::AreaCode;
pub use point::GeoPoint;
pub use tolerance::Tolerance;
