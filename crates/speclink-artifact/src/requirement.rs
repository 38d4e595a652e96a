//! Requirement entities and document status

use crate::id::{RequirementId, RequirementKind};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// How confidently the grammar matched a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// One of the five sentence shapes matched
    Matched,
    /// No shape matched; kind defaulted to ubiquitous
    Fallback,
}

/// Where a requirement's id came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    /// Written in the document and kept
    Declared,
    /// Assigned by the parser (bare line or reclassified)
    Assigned,
}

/// One testable statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Requirement id
    pub id: RequirementId,
    /// Kind derived from sentence shape
    pub kind: RequirementKind,
    /// Requirement sentence, trimmed
    pub text: String,
    /// Grammar confidence
    pub confidence: Confidence,
    /// 1-based line number in the normalized document
    pub line: usize,
    /// Id the line declared before reclassification replaced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<RequirementId>,
    /// Where the id came from
    pub id_source: IdSource,
}

impl Requirement {
    /// Whether the grammar fell back to the ubiquitous kind
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.confidence == Confidence::Fallback
    }

    /// Whether the declared id was replaced because the kind changed
    #[inline]
    #[must_use]
    pub fn was_reclassified(&self) -> bool {
        self.previous_id.is_some()
    }
}

/// Lifecycle status of a requirements document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecStatus {
    /// Being written
    Draft,
    /// Signed off
    Approved,
    /// Code exists for it
    Implemented,
}

impl SpecStatus {
    /// Lowercase name as written in front matter
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Implemented => "implemented",
        }
    }
}

impl Display for SpecStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            "implemented" => Ok(Self::Implemented),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Status value outside the recognized set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document status: '{0}'")]
pub struct UnknownStatus(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!("Draft".parse::<SpecStatus>(), Ok(SpecStatus::Draft));
        assert_eq!(" approved ".parse::<SpecStatus>(), Ok(SpecStatus::Approved));
        assert!("shipped".parse::<SpecStatus>().is_err());
    }

    #[test]
    fn requirement_flags() {
        let req = Requirement {
            id: RequirementId::raw("REQ-SPEC-001-U-01"),
            kind: RequirementKind::Ubiquitous,
            text: "Something happens.".to_string(),
            confidence: Confidence::Fallback,
            line: 3,
            previous_id: None,
            id_source: IdSource::Assigned,
        };
        assert!(req.is_fallback());
        assert!(!req.was_reclassified());
    }
}
