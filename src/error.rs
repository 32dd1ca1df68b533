//! Error taxonomy for admin area lookups.
//!
//! Validation variants are produced before any cache or store round trip.
//! Adapter failures are logged where they happen and collapse into
//! [`LookupError::StoreUnavailable`] so no query text reaches a caller.

use std::fmt;

use thiserror::Error;

use crate::validation::MAX_BATCH_SIZE;

/// Result alias used by the repository layer.
pub type LookupResult<T> = Result<T, LookupError>;

/// Which half of a coordinate failed range validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn bound(&self) -> u8 {
        match self {
            Axis::Latitude => 90,
            Axis::Longitude => 180,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Latitude => write!(f, "latitude"),
            Axis::Longitude => write!(f, "longitude"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("invalid admin level {level}: {reason}")]
    InvalidLevel { level: i64, reason: &'static str },

    #[error("invalid {axis} at index {index}: must be between -{bound} and {bound}", bound = .axis.bound())]
    InvalidCoordinate { index: usize, axis: Axis },

    #[error("{}", batch_message(.len))]
    EmptyOrOversizedBatch { len: usize },

    #[error("tolerance must be non-negative (got {0})")]
    InvalidTolerance(f64),

    #[error("malformed admin code '{code}': {reason}")]
    MalformedCode { code: String, reason: &'static str },

    #[error("admin area {key} not found at level {level}")]
    NotFound { level: u8, key: String },

    #[error("boundary '{code}' not found")]
    BoundaryNotFound { code: String },

    #[error("spatial store unavailable")]
    StoreUnavailable,
}

fn batch_message(len: &usize) -> String {
    if *len == 0 {
        "coordinates array cannot be empty".to_string()
    } else {
        format!(
            "coordinates array cannot exceed {} items (got {})",
            MAX_BATCH_SIZE, len
        )
    }
}

impl LookupError {
    pub(crate) fn malformed(code: &str, reason: &'static str) -> Self {
        LookupError::MalformedCode {
            code: code.to_string(),
            reason,
        }
    }

    /// True for errors caused by the request itself rather than by the
    /// data or the infrastructure behind it.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            LookupError::InvalidLevel { .. }
                | LookupError::InvalidCoordinate { .. }
                | LookupError::EmptyOrOversizedBatch { .. }
                | LookupError::InvalidTolerance(_)
                | LookupError::MalformedCode { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LookupError::NotFound { .. } | LookupError::BoundaryNotFound { .. }
        )
    }
}
