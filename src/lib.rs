//! Cypress Boundaries - administrative boundary lookups over a spatial store
//!
//! This library provides the level registry, repositories, cache and HTTP
//! API used by the `serve` binary.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod mapper;
pub mod models;
pub mod pip;
pub mod registry;
pub mod repository;
pub mod store;
pub mod validation;

pub use error::{LookupError, LookupResult};
pub use models::{AdminArea, AdminLevel, AreaCode, GeoPoint, Tolerance};
