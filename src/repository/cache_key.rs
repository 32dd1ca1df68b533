//! Canonical cache keys.
//!
//! Fields always appear in the same order, joined by `:`. Tolerance renders
//! through [`Tolerance::cache_fragment`], so an absent tolerance and a zero
//! tolerance share a key.

use std::fmt;

use crate::models::{AdminLevel, AreaCode, Tolerance};

const NAMESPACE: &str = "admin_area";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    fn build(parts: &[&str]) -> Self {
        let mut key = String::from(NAMESPACE);
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        CacheKey(key)
    }

    /// `admin_area:{level}:{id}:{tol}`
    pub fn by_id(level: AdminLevel, id: i64, tolerance: Tolerance) -> Self {
        Self::build(&[
            &level.to_string(),
            &id.to_string(),
            &tolerance.cache_fragment(),
        ])
    }

    /// `admin_area:code:{level}:{code}:{tol}`
    pub fn by_code(code: &AreaCode, tolerance: Tolerance) -> Self {
        Self::build(&[
            "code",
            &code.level().to_string(),
            code.as_str(),
            &tolerance.cache_fragment(),
        ])
    }

    /// `admin_area:list:{level}:{tol}`
    pub fn list(level: AdminLevel, tolerance: Tolerance) -> Self {
        Self::build(&["list", &level.to_string(), &tolerance.cache_fragment()])
    }

    /// `admin_area:children:{level}:{group}:{tol}`, keyed by the child level
    /// and the parent's group, so `AUT.9` and `AUT.9_1` share an entry
    pub fn children(parent: &AreaCode, child_level: AdminLevel, tolerance: Tolerance) -> Self {
        Self::build(&[
            "children",
            &child_level.to_string(),
            parent.group(),
            &tolerance.cache_fragment(),
        ])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
