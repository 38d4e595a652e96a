//! EARS grammar matcher
//!
//! Classifies a requirement sentence into one of five shapes. Rules are tried
//! most specific first so that ambiguous sentences resolve deterministically:
//!
//! 1. `IF <cond>, THEN the system shall NOT <behavior>` → N
//! 2. `WHILE <state>, the system shall <req>` → S
//! 3. `WHEN <event>, the system shall <req>` → E
//! 4. `WHERE <feature>, the system shall <req>` → O
//! 5. `The system shall <req>` → U
//!
//! A sentence matching none of them is still a requirement: kind U with
//! [`Confidence::Fallback`].

use once_cell::sync::Lazy;
use regex::Regex;
use speclink_artifact::{Confidence, RequirementKind};

static RULES: Lazy<Vec<(Regex, RequirementKind)>> = Lazy::new(|| {
    [
        (
            r"(?i)^if\s+.+?,?\s+then\s+the\s+system\s+shall\s+not\b",
            RequirementKind::Negative,
        ),
        (r"(?i)^while\s+.+?,?\s+the\s+system\s+shall\b", RequirementKind::StateDriven),
        (r"(?i)^when\s+.+?,?\s+the\s+system\s+shall\b", RequirementKind::EventDriven),
        (r"(?i)^where\s+.+?,?\s+the\s+system\s+shall\b", RequirementKind::Optional),
        (r"(?i)^the\s+system\s+shall\b", RequirementKind::Ubiquitous),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(pattern).expect("grammar rule is valid"), kind))
    .collect()
});

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*+]|\d{1,3}[.)])\s+").expect("list marker pattern is valid"));

static ID_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\*\*(?P<bold>REQ-[^*\s:]+):?\*\*|(?P<plain>REQ-[^*\s:]+))\s*:?\s*")
        .expect("id prefix pattern is valid")
});

/// Result of classifying one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Requirement kind
    pub kind: RequirementKind,
    /// Sentence, trimmed, otherwise verbatim
    pub text: String,
    /// Whether a rule matched
    pub confidence: Confidence,
}

/// Classify a sentence
///
/// Total over every input; never fails.
#[must_use]
pub fn classify(sentence: &str) -> Classification {
    let text = sentence.trim();
    let matched = RULES
        .iter()
        .find(|(rule, _)| rule.is_match(text))
        .map(|(_, kind)| *kind);

    Classification {
        kind: matched.unwrap_or(RequirementKind::Ubiquitous),
        text: text.to_string(),
        confidence: if matched.is_some() {
            Confidence::Matched
        } else {
            Confidence::Fallback
        },
    }
}

/// A requirement line split into its declared id and sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequirementLine<'a> {
    /// Id written on the line, verbatim (may be malformed)
    pub declared_id: Option<&'a str>,
    /// Sentence after list marker and id prefix
    pub sentence: &'a str,
}

/// Strip a list marker and an optional `**REQ-…**:` prefix from a line
#[must_use]
pub fn split_requirement_line(line: &str) -> RequirementLine<'_> {
    let mut rest = line.trim();
    if let Some(m) = LIST_MARKER.find(rest) {
        rest = &rest[m.end()..];
    }

    let mut declared_id = None;
    if let Some(caps) = ID_PREFIX.captures(rest) {
        declared_id = caps
            .name("bold")
            .or_else(|| caps.name("plain"))
            .map(|m| m.as_str());
        if let Some(whole) = caps.get(0) {
            rest = &rest[whole.end()..];
        }
    }

    RequirementLine {
        declared_id,
        sentence: rest.trim(),
    }
}
