//! Record identifiers
//!
//! Every stored document is keyed by a [`RecordId`]. Identifiers travel through
//! the API as strings, and ownership fields may reach the policy engine in a
//! different textual form than the principal's own id (upper-case hex, braces,
//! surrounding whitespace). [`canonical_id`] folds all of those onto one form so
//! comparisons never produce false negatives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Allocate a fresh random identifier
    pub fn new() -> Self {
        RecordId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        RecordId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse an identifier taken from a path segment or request body.
    ///
    /// Returns `None` for anything that is not a well-formed id; callers decide
    /// whether that means "not found" or "invalid reference".
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(RecordId)
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RecordId(Uuid::parse_str(s.trim())?))
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        RecordId(value)
    }
}

/// Canonical string form of any identifier representation.
///
/// Well-formed ids collapse to lower-case hyphenated form; anything else is
/// only trimmed, so two unparseable strings still compare verbatim.
pub fn canonical_id(raw: &str) -> String {
    match Uuid::parse_str(raw.trim()) {
        Ok(uuid) => uuid.hyphenated().to_string(),
        Err(_) => raw.trim().to_string(),
    }
}
