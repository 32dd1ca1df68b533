//! Hierarchical admin codes (`THA`, `AUT.1`, `THA.3_1`, `AUT.1.4.15.1`).

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::AdminLevel;
use crate::error::{LookupError, LookupResult};

/// Separator between hierarchy segments.
pub const SEGMENT_SEPARATOR: char = '.';

/// Separator between a segment and its GADM version suffix.
pub const VERSION_SEPARATOR: char = '_';

const MAX_SEGMENTS: usize = 5;

static COUNTRY_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,3}$").expect("static regex"));

static SUB_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(_[0-9]+)?$").expect("static regex"));

/// A validated admin code. The level is implied by the segment count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct AreaCode {
    raw: String,
    level: AdminLevel,
}

impl AreaCode {
    /// Parse a code, deriving its level from the number of segments.
    pub fn parse(raw: &str) -> LookupResult<Self> {
        if raw.is_empty() {
            return Err(LookupError::malformed(raw, "code is empty"));
        }

        let segments: Vec<&str> = raw.split(SEGMENT_SEPARATOR).collect();
        if segments.len() > MAX_SEGMENTS {
            return Err(LookupError::malformed(raw, "more than five segments"));
        }

        if !COUNTRY_SEGMENT.is_match(segments[0]) {
            return Err(LookupError::malformed(
                raw,
                "country segment must be 2 or 3 uppercase letters",
            ));
        }

        if !segments[1..].iter().all(|s| SUB_SEGMENT.is_match(s)) {
            return Err(LookupError::malformed(
                raw,
                "sub-level segments must be digits with an optional _N suffix",
            ));
        }

        let level = AdminLevel::from_index(segments.len() as i64 - 1)?;
        Ok(Self {
            raw: raw.to_string(),
            level,
        })
    }

    /// Parse a code that must sit at `level`.
    pub fn parse_at(raw: &str, level: AdminLevel) -> LookupResult<Self> {
        let code = Self::parse(raw)?;
        if code.level != level {
            return Err(LookupError::malformed(
                raw,
                "segment count does not match the requested level",
            ));
        }
        Ok(code)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn level(&self) -> AdminLevel {
        self.level
    }

    /// True when the code names one specific row: countries, or codes whose
    /// last segment carries a version suffix.
    pub fn is_leaf(&self) -> bool {
        self.level == AdminLevel::Country || self.last_segment().contains(VERSION_SEPARATOR)
    }

    /// The code with any version suffix on its last segment removed
    /// (`AUT.1_1` -> `AUT.1`). Children carry this form as their parent code.
    pub fn group(&self) -> &str {
        match self.raw.rfind(VERSION_SEPARATOR) {
            Some(pos) if pos > self.raw.rfind(SEGMENT_SEPARATOR).unwrap_or(0) => &self.raw[..pos],
            _ => &self.raw,
        }
    }

    /// Code of the enclosing area, `None` at country level.
    pub fn parent_code(&self) -> Option<&str> {
        parent_of(&self.raw)
    }

    fn last_segment(&self) -> &str {
        self.raw
            .rsplit(SEGMENT_SEPARATOR)
            .next()
            .unwrap_or(&self.raw)
    }
}

/// Drop the last dotted segment of a code.
pub fn parent_of(code: &str) -> Option<&str> {
    code.rfind(SEGMENT_SEPARATOR).map(|pos| &code[..pos])
}

impl From<AreaCode> for String {
    fn from(code: AreaCode) -> Self {
        code.raw
    }
}

impl std::fmt::Display for AreaCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for AreaCode {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AreaCode::parse(s)
    }
}
