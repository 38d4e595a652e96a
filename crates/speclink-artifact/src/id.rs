//! Identifiers: spec ids, requirement kinds and requirement ids
//!
//! A requirement id has the shape `REQ-<specId>-<kind>-<seq>`, for example
//! `REQ-SPEC-007-U-01`. The same grammar is used when parsing documents and
//! when scanning source files for back-reference markers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

static REQUIREMENT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^REQ-(?P<spec>[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*?)-(?P<kind>[USEON])-(?P<seq>\d+)$")
        .expect("requirement id pattern is valid")
});

static REQUIREMENT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bREQ-[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*?-[USEON]-\d+\b")
        .expect("requirement token pattern is valid")
});

/// Identifier of one requirements document (e.g. `SPEC-007`)
///
/// Stored as written. Well-formedness is a validation concern, so a
/// document with a malformed id can still be parsed and inspected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecId(String);

impl SpecId {
    /// Wrap a raw id
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    /// Build `PREFIX-NNN`
    #[must_use]
    pub fn from_number(prefix: &str, number: u32) -> Self {
        Self(format!("{prefix}-{number:03}"))
    }

    /// Raw id text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id has the form `<prefix>-NNN` (exactly three digits)
    #[must_use]
    pub fn is_well_formed(&self, prefix: &str) -> bool {
        self.0
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|digits| digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Trailing number, when the id ends in `-<digits>`
    #[must_use]
    pub fn number(&self) -> Option<u32> {
        self.0.rsplit_once('-').and_then(|(_, n)| n.parse().ok())
    }

    /// Whether the id is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for SpecId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// EARS requirement kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RequirementKind {
    /// `The system shall …`
    #[serde(rename = "U")]
    Ubiquitous,
    /// `WHILE <state>, the system shall …`
    #[serde(rename = "S")]
    StateDriven,
    /// `WHEN <event>, the system shall …`
    #[serde(rename = "E")]
    EventDriven,
    /// `WHERE <feature>, the system shall …`
    #[serde(rename = "O")]
    Optional,
    /// `IF <cond>, THEN the system shall NOT …`
    #[serde(rename = "N")]
    Negative,
}

impl RequirementKind {
    /// All kinds in document order
    pub const ALL: [Self; 5] = [
        Self::Ubiquitous,
        Self::StateDriven,
        Self::EventDriven,
        Self::Optional,
        Self::Negative,
    ];

    /// Single-letter code used inside requirement ids
    #[inline]
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Ubiquitous => 'U',
            Self::StateDriven => 'S',
            Self::EventDriven => 'E',
            Self::Optional => 'O',
            Self::Negative => 'N',
        }
    }

    /// Parse a single-letter code
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'U' => Some(Self::Ubiquitous),
            'S' => Some(Self::StateDriven),
            'E' => Some(Self::EventDriven),
            'O' => Some(Self::Optional),
            'N' => Some(Self::Negative),
            _ => None,
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ubiquitous => "Ubiquitous",
            Self::StateDriven => "State-Driven",
            Self::EventDriven => "Event-Driven",
            Self::Optional => "Optional",
            Self::Negative => "Unwanted Behavior",
        }
    }
}

impl Display for RequirementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Identifier of one requirement
///
/// Like [`SpecId`] this keeps the raw text; [`RequirementId::parts`] returns
/// the structured form when the id is well formed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementId(String);

/// Structured view of a well-formed requirement id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementIdParts {
    /// Embedded spec id (`SPEC-007`)
    pub spec: String,
    /// Kind letter
    pub kind: RequirementKind,
    /// Per-kind sequence number
    pub seq: u32,
}

impl RequirementId {
    /// Wrap a raw id without checking it
    #[inline]
    #[must_use]
    pub fn raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a well-formed id
    #[must_use]
    pub fn new(spec: &SpecId, kind: RequirementKind, seq: u32) -> Self {
        Self(format!("REQ-{}-{}-{seq:02}", spec.as_str(), kind.code()))
    }

    /// Raw id text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Structured components, `None` when malformed
    #[must_use]
    pub fn parts(&self) -> Option<RequirementIdParts> {
        let caps = REQUIREMENT_ID.captures(&self.0)?;
        let kind = caps["kind"].chars().next().and_then(RequirementKind::from_code)?;
        let seq = caps["seq"].parse().ok()?;
        Some(RequirementIdParts {
            spec: caps["spec"].to_string(),
            kind,
            seq,
        })
    }

    /// Whether the id matches `REQ-<spec>-<kind>-<seq>`
    #[inline]
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.parts().is_some()
    }

    /// Find every requirement-id token in a line, with byte offsets
    pub fn find_all(line: &str) -> impl Iterator<Item = (usize, RequirementId)> + '_ {
        REQUIREMENT_TOKEN
            .find_iter(line)
            .map(|m| (m.start(), RequirementId(m.as_str().to_string())))
    }
}

impl Display for RequirementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RequirementId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self(s.trim().to_string());
        if id.is_well_formed() {
            Ok(id)
        } else {
            Err(IdError::MalformedRequirementId(s.to_string()))
        }
    }
}

/// Identifier errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Requirement id does not match `REQ-<spec>-<kind>-<seq>`
    #[error("malformed requirement id: '{0}'")]
    MalformedRequirementId(String),
}
