//! Traceability synchronizer
//!
//! Scans a source tree for requirement back-references, derives one
//! [`TraceabilityEntry`] per requirement (the matrix is total, in
//! requirement order) and rewrites the document's machine-owned
//! traceability section. Every other section is left byte-for-byte alone.
//!
//! A reference in a comment counts as "implemented" whether or not real
//! code sits next to it. That is a known limitation of marker scanning.

use crate::config::SpeclinkConfig;
use crate::error::SyncError;
use crate::scan::{ReferenceHit, SourceScanner};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use speclink_artifact::{RequirementId, SourceLocation, SpecId, TraceStatus, TraceabilityEntry};
use speclink_document::{parse_table, render_section_body, split_section, CoverageCounts, SpecDocument};
use std::path::{Path, PathBuf};

/// Reference to an id of this document that is not one of its requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanReference {
    /// Referenced id
    pub id: RequirementId,
    /// Where it was found
    pub location: SourceLocation,
}

/// Something the synchronizer changed that a human may care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncNotice {
    /// Hand-written lines in the machine-owned section were dropped
    ManualContentOverwritten {
        /// Dropped lines, trimmed
        lines: Vec<String>,
    },
    /// A row's status differs from the previous table
    StatusChanged {
        /// Requirement
        id: RequirementId,
        /// Status in the previous table
        from: TraceStatus,
        /// Newly derived status
        to: TraceStatus,
    },
}

/// Result of one synchronization or verification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    /// Document id
    pub spec_id: SpecId,
    /// Feature name, if declared
    pub feature: Option<String>,
    /// One entry per requirement, in requirement order
    pub entries: Vec<TraceabilityEntry>,
    /// Covered over total, `0.0` for no requirements
    pub coverage: f64,
    /// Tested over total
    pub tested_coverage: f64,
    /// Status counts
    pub counts: CoverageCounts,
    /// Non-test files referencing a requirement of this document
    pub code_files: Vec<PathBuf>,
    /// Test files referencing a requirement of this document
    pub test_files: Vec<PathBuf>,
    /// References to unknown ids carrying this document's spec id
    pub orphan_references: Vec<OrphanReference>,
    /// Overwrite and status-change notices (empty for `verify`)
    pub notices: Vec<SyncNotice>,
}

impl SyncReport {
    /// Entry for a requirement
    #[must_use]
    pub fn entry(&self, id: &RequirementId) -> Option<&TraceabilityEntry> {
        self.entries.iter().find(|e| &e.requirement_id == id)
    }
}

/// Rewrites a document's traceability section from a source scan
#[derive(Debug, Clone)]
pub struct Synchronizer {
    scanner: SourceScanner,
    title: String,
    heading_level: u8,
}

impl Synchronizer {
    /// Create from configuration
    #[must_use]
    pub fn new(config: &SpeclinkConfig) -> Self {
        Self {
            scanner: SourceScanner::new(&config.scan),
            title: config.traceability_title().to_string(),
            heading_level: config.traceability_heading_level,
        }
    }

    /// Skip a file while scanning (the document itself)
    #[must_use]
    pub fn excluding(mut self, path: impl AsRef<Path>) -> Self {
        self.scanner = self.scanner.excluding(path);
        self
    }

    /// Scan `source_root` and return the updated document with its report
    ///
    /// # Errors
    /// - `SyncError::Walk` / `SyncError::Io` when the tree cannot be scanned
    pub fn synchronize(
        &self,
        doc: &SpecDocument,
        source_root: impl AsRef<Path>,
    ) -> Result<(SpecDocument, SyncReport), SyncError> {
        let mut report = self.verify(doc, source_root)?;
        let mut updated = doc.clone();

        let previous = doc.traceability_section().map(|s| s.body().to_string());
        let (tail, is_last) = match &previous {
            Some(body) => {
                report.notices = diff_previous(body, &report.entries);
                (split_section(body).tail, doc.traceability_is_last())
            }
            None => (String::new(), true),
        };

        let body = render_section_body(&report.entries, &report.counts, &tail, is_last);
        let level = doc
            .requirements_section()
            .map_or(self.heading_level, |s| s.level.min(self.heading_level));
        updated.set_traceability_body(body, &self.title, level);

        tracing::info!(
            spec = %doc.id(),
            requirements = report.entries.len(),
            coverage = report.coverage,
            notices = report.notices.len(),
            "traceability synchronized"
        );
        Ok((updated, report))
    }

    /// Scan and report without touching the document
    ///
    /// # Errors
    /// - `SyncError::Walk` / `SyncError::Io` when the tree cannot be scanned
    pub fn verify(&self, doc: &SpecDocument, source_root: impl AsRef<Path>) -> Result<SyncReport, SyncError> {
        let scan = self.scanner.scan(source_root)?;
        Ok(build_report(doc, &scan.hits))
    }
}

fn build_report(doc: &SpecDocument, hits: &[ReferenceHit]) -> SyncReport {
    let mut code: IndexMap<&RequirementId, Vec<SourceLocation>> = IndexMap::new();
    let mut tests: IndexMap<&RequirementId, Vec<SourceLocation>> = IndexMap::new();
    let mut code_files = IndexSet::new();
    let mut test_files = IndexSet::new();
    let mut orphan_references = Vec::new();

    for hit in hits {
        if doc.requirement(&hit.id).is_none() {
            if embeds_spec(&hit.id, doc.id()) {
                orphan_references.push(OrphanReference {
                    id: hit.id.clone(),
                    location: hit.location.clone(),
                });
            }
            continue;
        }
        let (locations, files) = if hit.is_test {
            (&mut tests, &mut test_files)
        } else {
            (&mut code, &mut code_files)
        };
        locations.entry(&hit.id).or_default().push(hit.location.clone());
        files.insert(hit.location.path.clone());
    }

    let entries: Vec<TraceabilityEntry> = doc
        .requirements()
        .iter()
        .map(|req| {
            TraceabilityEntry::new(
                req.id.clone(),
                code.get(&req.id).cloned().unwrap_or_default(),
                tests.get(&req.id).cloned().unwrap_or_default(),
            )
        })
        .collect();
    let counts = CoverageCounts::of(&entries);

    SyncReport {
        spec_id: doc.id().clone(),
        feature: doc.feature().map(str::to_string),
        coverage: counts.coverage(),
        tested_coverage: counts.tested_coverage(),
        counts,
        entries,
        code_files: code_files.into_iter().collect(),
        test_files: test_files.into_iter().collect(),
        orphan_references,
        notices: Vec::new(),
    }
}

fn embeds_spec(id: &RequirementId, spec: &SpecId) -> bool {
    id.parts().is_some_and(|parts| parts.spec == spec.as_str())
}

fn diff_previous(body: &str, entries: &[TraceabilityEntry]) -> Vec<SyncNotice> {
    let mut notices = Vec::new();
    let manual = split_section(body).manual_lines;
    if !manual.is_empty() {
        tracing::warn!(lines = manual.len(), "overwriting manual lines in traceability section");
        notices.push(SyncNotice::ManualContentOverwritten { lines: manual });
    }

    let rows = match parse_table(body) {
        Ok(rows) => rows,
        Err(error) => {
            tracing::debug!(%error, "previous traceability table unreadable");
            Vec::new()
        }
    };
    for entry in entries {
        let Some(row) = rows.iter().find(|r| r.requirement_id == entry.requirement_id.as_str()) else {
            continue;
        };
        if row.status != entry.status {
            notices.push(SyncNotice::StatusChanged {
                id: entry.requirement_id.clone(),
                from: row.status,
                to: entry.status,
            });
        }
    }
    notices
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use speclink_document::parse;

    const DOC: &str = "---\nid: SPEC-007\nfeature: Login\nstatus: draft\n---\n# Login\n\n## Requirements\n\n- **REQ-SPEC-007-U-01**: The system shall validate an email address.\n- **REQ-SPEC-007-E-01**: WHEN the user submits the form, the system shall persist the record.\n\n## Notes\n\nKeep me.\n";

    fn tree(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, text) in files {
            let path = dir.path().join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }
        dir
    }

    fn sync() -> Synchronizer {
        Synchronizer::new(&SpeclinkConfig::default())
    }

    #[test]
    fn comment_marker_marks_implemented() {
        let doc = parse(DOC).unwrap();
        let dir = tree(&[("src/Email.kt", "// REQ-SPEC-007-U-01 handled here\n")]);
        let report = sync().verify(&doc, dir.path()).unwrap();

        let entry = report.entry(&RequirementId::raw("REQ-SPEC-007-U-01")).unwrap();
        assert_eq!(entry.status, TraceStatus::Implemented);
        assert_eq!(entry.code_locations, vec![SourceLocation::new("src/Email.kt", 1)]);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[1].status, TraceStatus::Pending);
        assert!((report.coverage - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reference_upgrades_to_tested() {
        let doc = parse(DOC).unwrap();
        let dir = tree(&[
            ("src/Email.kt", "// REQ-SPEC-007-U-01\n"),
            ("src/test/EmailTest.kt", "// REQ-SPEC-007-U-01\n// REQ-SPEC-007-E-01\n"),
        ]);
        let report = sync().verify(&doc, dir.path()).unwrap();
        assert_eq!(report.entries[0].status, TraceStatus::Tested);
        // A test reference alone does not implement anything
        assert_eq!(report.entries[1].status, TraceStatus::Pending);
        assert_eq!(report.test_files, vec![PathBuf::from("src/test/EmailTest.kt")]);
    }

    #[test]
    fn ids_in_code_stay_pending() {
        let doc = parse(DOC).unwrap();
        let dir = tree(&[(
            "src/Email.kt",
            "init(); val tag = \"REQ-SPEC-007-U-01\";\nval a = w * h + lookup(\"REQ-SPEC-007-E-01\")\nval u = \"https://x.io/REQ-SPEC-007-U-01\"\n",
        )]);
        let report = sync().verify(&doc, dir.path()).unwrap();
        assert!(report.entries.iter().all(|e| e.status == TraceStatus::Pending));
        assert_eq!(report.counts.pending, 2);
    }

    #[test]
    fn orphans_only_for_this_spec() {
        let doc = parse(DOC).unwrap();
        let dir = tree(&[("a.kt", "// REQ-SPEC-007-U-09\n// REQ-SPEC-008-U-01\n")]);
        let report = sync().verify(&doc, dir.path()).unwrap();
        let orphans: Vec<_> = report.orphan_references.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(orphans, vec!["REQ-SPEC-007-U-09"]);
    }

    #[test]
    fn appends_section_after_last_and_keeps_other_sections() {
        let doc = parse(DOC).unwrap();
        let dir = tree(&[("src/Email.kt", "// REQ-SPEC-007-U-01\n")]);
        let (updated, report) = sync().synchronize(&doc, dir.path()).unwrap();
        let text = updated.serialize();

        assert!(text.starts_with(&DOC[..DOC.find("Keep me.").unwrap()]));
        assert!(text.contains("Keep me.\n## Traceability Matrix\n\n| Requirement |"));
        assert!(text.contains("| REQ-SPEC-007-U-01 | src/Email.kt:1 | — | 🟢 Implemented |"));
        assert!(report.notices.is_empty());
    }

    #[test]
    fn resync_is_stable_and_reports_changes() {
        let doc = parse(DOC).unwrap();
        let dir = tree(&[("src/Email.kt", "// REQ-SPEC-007-U-01\n")]);
        let (first, _) = sync().synchronize(&doc, dir.path()).unwrap();
        let (second, report) = sync().synchronize(&first, dir.path()).unwrap();
        assert_eq!(first.serialize(), second.serialize());
        assert!(report.notices.is_empty());

        std::fs::write(dir.path().join("src/Email.kt"), "fun x() = 1\n").unwrap();
        let (_, report) = sync().synchronize(&second, dir.path()).unwrap();
        assert_eq!(
            report.notices,
            vec![SyncNotice::StatusChanged {
                id: RequirementId::raw("REQ-SPEC-007-U-01"),
                from: TraceStatus::Implemented,
                to: TraceStatus::Pending,
            }]
        );
    }

    #[test]
    fn nested_traceability_section_is_replaced_in_place() {
        let text = DOC.replace(
            "\n## Notes\n",
            "\n### Traceability Matrix\n\n| Requirement | Code File | Test File | Status |\n|---|---|---|---|\n\n## Notes\n",
        );
        let doc = parse(&text).unwrap();
        assert_eq!(doc.requirements().len(), 2);
        let dir = tree(&[("src/Email.kt", "// REQ-SPEC-007-U-01\n")]);

        let (first, _) = sync().synchronize(&doc, dir.path()).unwrap();
        let (second, _) = sync().synchronize(&first, dir.path()).unwrap();
        let out = second.serialize();
        assert_eq!(out.matches("Traceability Matrix").count(), 1);
        assert!(out.contains("### Traceability Matrix\n\n| Requirement |"));
        assert!(out.contains("| REQ-SPEC-007-U-01 | src/Email.kt:1 | — | 🟢 Implemented |"));
        assert!(out.ends_with("## Notes\n\nKeep me.\n"));
    }

    #[test]
    fn manual_lines_are_overwritten_and_flagged() {
        let text = format!("{DOC}\n## Traceability Matrix\n\nhand note\n\n| Requirement | Code File | Test File | Status |\n|---|---|---|---|\n");
        let doc = parse(&text).unwrap();
        let dir = tree(&[("README", "nothing\n")]);
        let (updated, report) = sync().synchronize(&doc, dir.path()).unwrap();
        assert_eq!(
            report.notices,
            vec![SyncNotice::ManualContentOverwritten {
                lines: vec!["hand note".to_string()]
            }]
        );
        assert!(!updated.serialize().contains("hand note"));
    }
}
