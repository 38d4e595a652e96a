//! Traceability entries
//!
//! A [`TraceabilityEntry`] is derived on every synchronization run and only
//! ever persisted as a row of the document's traceability table.

use crate::id::RequirementId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Implementation status of one requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    /// No code reference found
    Pending,
    /// Referenced from code only
    Implemented,
    /// Referenced from code and from a test
    Tested,
}

impl TraceStatus {
    /// Status implied by the presence of code and test references
    ///
    /// A test reference without a code reference stays `Pending`.
    #[must_use]
    pub const fn derive(has_code: bool, has_test: bool) -> Self {
        match (has_code, has_test) {
            (true, true) => Self::Tested,
            (true, false) => Self::Implemented,
            (false, _) => Self::Pending,
        }
    }

    /// Lowercase keyword
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Implemented => "implemented",
            Self::Tested => "tested",
        }
    }

    /// Table cell text (emoji plus label)
    #[must_use]
    pub const fn badge(self) -> &'static str {
        match self {
            Self::Pending => "⏳ Pending",
            Self::Implemented => "🟢 Implemented",
            Self::Tested => "✅ Tested",
        }
    }

    /// Whether the requirement counts toward coverage
    #[inline]
    #[must_use]
    pub const fn is_covered(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for TraceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(file, line)` pair where a marker was found
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path relative to the scanned root
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
}

impl SourceLocation {
    /// Create a location
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Forward slashes keep the table stable across platforms
        let path = self.path.to_string_lossy().replace('\\', "/");
        write!(f, "{path}:{}", self.line)
    }
}

/// One row of the traceability matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceabilityEntry {
    /// Requirement this row describes
    pub requirement_id: RequirementId,
    /// Derived status
    pub status: TraceStatus,
    /// Code references
    pub code_locations: Vec<SourceLocation>,
    /// Test references
    pub test_locations: Vec<SourceLocation>,
}

impl TraceabilityEntry {
    /// Create an entry; status is derived from the locations
    #[must_use]
    pub fn new(
        requirement_id: RequirementId,
        code_locations: Vec<SourceLocation>,
        test_locations: Vec<SourceLocation>,
    ) -> Self {
        let status = TraceStatus::derive(!code_locations.is_empty(), !test_locations.is_empty());
        Self {
            requirement_id,
            status,
            code_locations,
            test_locations,
        }
    }

    /// Entry with no references
    #[inline]
    #[must_use]
    pub fn pending(requirement_id: RequirementId) -> Self {
        Self::new(requirement_id, Vec::new(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_status() {
        assert_eq!(TraceStatus::derive(false, false), TraceStatus::Pending);
        assert_eq!(TraceStatus::derive(false, true), TraceStatus::Pending);
        assert_eq!(TraceStatus::derive(true, false), TraceStatus::Implemented);
        assert_eq!(TraceStatus::derive(true, true), TraceStatus::Tested);
    }

    #[test]
    fn entry_derives_from_locations() {
        let id = RequirementId::raw("REQ-SPEC-007-U-01");
        let entry = TraceabilityEntry::new(id.clone(), vec![SourceLocation::new("src/a.kt", 3)], vec![]);
        assert_eq!(entry.status, TraceStatus::Implemented);
        assert_eq!(TraceabilityEntry::pending(id).status, TraceStatus::Pending);
    }

    #[test]
    fn location_display() {
        let loc = SourceLocation::new("src/main/A.kt", 12);
        assert_eq!(loc.to_string(), "src/main/A.kt:12");
    }
}
