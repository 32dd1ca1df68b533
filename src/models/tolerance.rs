//! Geometry simplification budget.

use crate::error::{LookupError, LookupResult};

/// Rendering of [`Tolerance::Exact`] inside cache keys.
pub const EXACT_KEY: &str = "<nil>";

/// How much polygon detail the store may discard.
///
/// Absent and zero tolerances are the same request, so both collapse into
/// `Exact` at parse time and every later decision matches on the tag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Tolerance {
    #[default]
    Exact,
    Simplify(f64),
}

impl Tolerance {
    /// Normalize an optional request parameter.
    pub fn from_option(value: Option<f64>) -> LookupResult<Self> {
        match value {
            None => Ok(Tolerance::Exact),
            Some(v) if v.is_nan() || v.is_infinite() || v < 0.0 => {
                Err(LookupError::InvalidTolerance(v))
            }
            Some(v) if v == 0.0 => Ok(Tolerance::Exact),
            Some(v) => Ok(Tolerance::Simplify(v)),
        }
    }

    /// Simplification budget to hand to the store, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Tolerance::Exact => None,
            Tolerance::Simplify(v) => Some(*v),
        }
    }

    /// Canonical text used in cache keys: fixed 10-digit precision so equal
    /// values never produce distinct keys.
    pub fn cache_fragment(&self) -> String {
        match self {
            Tolerance::Exact => EXACT_KEY.to_string(),
            Tolerance::Simplify(v) => format!("{:.10}", v),
        }
    }
}
