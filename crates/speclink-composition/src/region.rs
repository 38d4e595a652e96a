//! Two-region file model
//!
//! A generated file is a generator-owned header region followed by a
//! developer-owned body region. The header runs from the top of the file
//! through the line holding [`END_HEADER`]; the line holding
//! [`GENERATED_FROM`] marks the file as generated.

use crate::error::RegionError;
use serde::Serialize;
use speclink_artifact::{RequirementId, Role, SpecId};
use std::ops::Range;

/// Opening sentinel
pub const GENERATED_FROM: &str = "GENERATED-FROM:";

/// Closing sentinel
pub const END_HEADER: &str = "END-GENERATED-HEADER";

/// How an existing file relates to the two-region model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum FileState {
    /// Both sentinels present
    Managed {
        /// Header region text
        header: String,
        /// Body region text
        body: String,
    },
    /// Opening sentinel present, closing sentinel deleted
    HeaderOpen,
    /// No opening sentinel: written by hand
    Unmanaged,
}

/// Header-then-body file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionedFile {
    header: String,
    body: String,
}

impl RegionedFile {
    /// Create from a header region and a body region
    ///
    /// # Errors
    /// `RegionError::MissingSentinel` when the header lacks either sentinel
    /// or does not end with a newline.
    pub fn new(header: impl Into<String>, body: impl Into<String>) -> Result<Self, RegionError> {
        let header = header.into();
        if !header.contains(GENERATED_FROM) {
            return Err(RegionError::MissingSentinel(GENERATED_FROM));
        }
        if header_line_range(&header).is_none() || !header.ends_with('\n') {
            return Err(RegionError::MissingSentinel(END_HEADER));
        }
        Ok(Self {
            header,
            body: body.into(),
        })
    }

    /// Header region
    #[inline]
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Body region
    #[inline]
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Full file text
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.header.len() + self.body.len());
        out.push_str(&self.header);
        out.push_str(&self.body);
        out
    }

    /// This file's header on top of another body
    #[must_use]
    pub fn with_body(&self, body: &str) -> String {
        let mut out = String::with_capacity(self.header.len() + body.len());
        out.push_str(&self.header);
        out.push_str(body);
        out
    }
}

/// Classify existing file text
#[must_use]
pub fn inspect(text: &str) -> FileState {
    match header_line_range(text) {
        Some(lines) => {
            let end = text
                .split_inclusive('\n')
                .take(lines.end)
                .map(str::len)
                .sum::<usize>();
            FileState::Managed {
                header: text[..end].to_string(),
                body: text[end..].to_string(),
            }
        }
        None if text.lines().any(|line| line.contains(GENERATED_FROM)) => FileState::HeaderOpen,
        None => FileState::Unmanaged,
    }
}

/// 0-based line range `[opening, closing]` of the first complete header
///
/// The range end is exclusive (one past the closing line).
#[must_use]
pub fn header_line_range(text: &str) -> Option<Range<usize>> {
    let mut opening = None;
    for (index, line) in text.lines().enumerate() {
        if opening.is_none() && line.contains(GENERATED_FROM) {
            opening = Some(index);
        } else if opening.is_some() && line.contains(END_HEADER) {
            return opening.map(|start| start..index + 1);
        }
    }
    None
}

/// Every complete header's line range (0-based, end exclusive)
#[must_use]
pub fn header_line_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut opening = None;
    for (index, line) in text.lines().enumerate() {
        if line.contains(GENERATED_FROM) {
            opening.get_or_insert(index);
        } else if line.contains(END_HEADER) {
            if let Some(start) = opening.take() {
                ranges.push(start..index + 1);
            }
        }
    }
    ranges
}

/// Contents of a header block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    /// Source document
    pub spec_id: SpecId,
    /// Role of the file
    pub role: Role,
    /// Entity name
    pub entity: String,
    /// Requirement back-references
    pub refs: Vec<RequirementId>,
}

impl HeaderBlock {
    /// Render with a line-comment prefix (`//`, `#`, `--`)
    ///
    /// # Errors
    /// `RegionError::InvalidCommentPrefix` for an empty or multi-line prefix.
    pub fn render(&self, comment_prefix: &str) -> Result<String, RegionError> {
        let prefix = comment_prefix.trim_end();
        if prefix.is_empty() || prefix.contains('\n') {
            return Err(RegionError::InvalidCommentPrefix(comment_prefix.to_string()));
        }
        let refs = if self.refs.is_empty() {
            "none".to_string()
        } else {
            self.refs
                .iter()
                .map(RequirementId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        Ok(format!(
            "{prefix} {GENERATED_FROM} {}\n{prefix} role: {}\n{prefix} entity: {}\n{prefix} refs: {refs}\n{prefix} {END_HEADER}\n",
            self.spec_id, self.role, self.entity
        ))
    }
}
