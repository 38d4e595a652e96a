//! Merge strategies for regenerated files
//!
//! Decide what to do when a freshly rendered [`RegionedFile`] meets whatever
//! already sits at its path.

use crate::region::{inspect, FileState, RegionedFile};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Why an existing file was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Opening sentinel present, closing sentinel removed
    MissingEndSentinel,
    /// No sentinel at all: the file was written by hand
    NotGenerated,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingEndSentinel => "closing header sentinel missing",
            Self::NotGenerated => "file is not generator-owned",
        })
    }
}

/// What to write, if anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeDecision {
    /// No file yet; write this text
    Create(String),
    /// Header changed; write this text (body kept byte-for-byte)
    ReplaceHeader(String),
    /// Existing text already matches
    Unchanged,
    /// Developer-owned file replaced with this text
    Overwrite(String),
    /// Leave the file alone
    Skip(SkipReason),
}

impl MergeDecision {
    /// Text to write, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Create(text) | Self::ReplaceHeader(text) | Self::Overwrite(text) => Some(text),
            Self::Unchanged | Self::Skip(_) => None,
        }
    }
}

/// Strategy for combining generated and existing file text
pub trait MergeStrategy: std::fmt::Debug {
    /// Decide the outcome for one path
    fn merge(&self, existing: Option<&str>, generated: &RegionedFile) -> MergeDecision;

    /// Strategy name (for logging)
    fn name(&self) -> &'static str;
}

/// Rewrite the header region only; never touch developer-owned files
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderOnlyMerge;

impl MergeStrategy for HeaderOnlyMerge {
    fn merge(&self, existing: Option<&str>, generated: &RegionedFile) -> MergeDecision {
        let Some(existing) = existing else {
            return MergeDecision::Create(generated.render());
        };
        match inspect(existing) {
            FileState::Managed { header, body } => {
                if header == generated.header() {
                    MergeDecision::Unchanged
                } else {
                    MergeDecision::ReplaceHeader(generated.with_body(&body))
                }
            }
            FileState::HeaderOpen => MergeDecision::Skip(SkipReason::MissingEndSentinel),
            FileState::Unmanaged => MergeDecision::Skip(SkipReason::NotGenerated),
        }
    }

    fn name(&self) -> &'static str {
        "header_only"
    }
}

/// Like [`HeaderOnlyMerge`], but replaces developer-owned files outright
#[derive(Debug, Clone, Copy, Default)]
pub struct ForceOverwrite;

impl MergeStrategy for ForceOverwrite {
    fn merge(&self, existing: Option<&str>, generated: &RegionedFile) -> MergeDecision {
        match HeaderOnlyMerge.merge(existing, generated) {
            MergeDecision::Skip(_) => {
                let text = generated.render();
                if existing == Some(text.as_str()) {
                    MergeDecision::Unchanged
                } else {
                    MergeDecision::Overwrite(text)
                }
            }
            decision => decision,
        }
    }

    fn name(&self) -> &'static str {
        "force_overwrite"
    }
}

/// Strategy for the `force` flag
#[must_use]
pub fn strategy_for(force: bool) -> &'static dyn MergeStrategy {
    if force {
        &ForceOverwrite
    } else {
        &HeaderOnlyMerge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn generated(refs: &str) -> RegionedFile {
        RegionedFile::new(
            format!("// GENERATED-FROM: SPEC-001\n// refs: {refs}\n// END-GENERATED-HEADER\n"),
            "class A\n",
        )
        .unwrap()
    }

    #[test]
    fn create_when_absent() {
        let file = generated("R1");
        assert_eq!(HeaderOnlyMerge.merge(None, &file), MergeDecision::Create(file.render()));
    }

    #[test]
    fn unchanged_when_header_matches() {
        let file = generated("R1");
        let existing = file.with_body("class A { fun hand() {} }\n");
        assert_eq!(HeaderOnlyMerge.merge(Some(&existing), &file), MergeDecision::Unchanged);
    }

    #[test]
    fn header_replaced_body_kept() {
        let old = generated("R1").with_body("class A { fun hand() {} }\n");
        let decision = HeaderOnlyMerge.merge(Some(&old), &generated("R1, R2"));
        assert_eq!(
            decision,
            MergeDecision::ReplaceHeader(
                "// GENERATED-FROM: SPEC-001\n// refs: R1, R2\n// END-GENERATED-HEADER\nclass A { fun hand() {} }\n"
                    .to_string()
            )
        );
    }

    #[test]
    fn skip_developer_files() {
        let file = generated("R1");
        assert_eq!(
            HeaderOnlyMerge.merge(Some("// GENERATED-FROM: SPEC-001\nclass A\n"), &file),
            MergeDecision::Skip(SkipReason::MissingEndSentinel)
        );
        assert_eq!(
            HeaderOnlyMerge.merge(Some("class Mine\n"), &file),
            MergeDecision::Skip(SkipReason::NotGenerated)
        );
    }

    #[test]
    fn force_overwrites_developer_files_only() {
        let file = generated("R1");
        assert_eq!(
            ForceOverwrite.merge(Some("class Mine\n"), &file),
            MergeDecision::Overwrite(file.render())
        );
        let managed = file.with_body("kept\n");
        assert_eq!(ForceOverwrite.merge(Some(&managed), &file), MergeDecision::Unchanged);
        assert_eq!(strategy_for(true).name(), "force_overwrite");
        assert_eq!(strategy_for(false).name(), "header_only");
    }
}
