//! Markdown reports derived from a [`SyncReport`]
//!
//! [`render_status_summary`] lists coverage per requirement;
//! [`render_architecture`] groups the referencing code files by
//! clean-architecture layer. Ids are written as code spans so a report
//! inside a scanned tree never reads as a back-reference.

use crate::sync::SyncReport;
use serde::Serialize;
use speclink_artifact::{SourceLocation, TraceStatus, TraceabilityEntry};
use speclink_document::coverage_line;
use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};

/// Render a human-readable status report
///
/// Layout: title, coverage line, implemented and pending requirement lists
/// with their locations, then the code and test files that reference the
/// document. Orphan references get their own section when present.
#[must_use]
pub fn render_status_summary(report: &SyncReport) -> String {
    StatusSummary(report).to_string()
}

struct StatusSummary<'a>(&'a SyncReport);

impl Display for StatusSummary<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let title = report.feature.as_deref().unwrap_or("Implementation");
        writeln!(f, "# {title} Status ({})\n", report.spec_id)?;
        writeln!(f, "{}\n", coverage_line(&report.counts))?;

        let (covered, pending): (Vec<&TraceabilityEntry>, Vec<&TraceabilityEntry>) =
            report.entries.iter().partition(|e| e.status.is_covered());

        f.write_str("## Implemented\n\n")?;
        if covered.is_empty() {
            f.write_str("_None yet._\n")?;
        }
        for entry in covered {
            let marker = if entry.status == TraceStatus::Tested { "x" } else { " " };
            writeln!(
                f,
                "- [{marker}] `{}` ({}): {}",
                entry.requirement_id,
                entry.status,
                join(&entry.code_locations)
            )?;
            if !entry.test_locations.is_empty() {
                writeln!(f, "  - tests: {}", join(&entry.test_locations))?;
            }
        }

        f.write_str("\n## Pending\n\n")?;
        if pending.is_empty() {
            f.write_str("_None._\n")?;
        }
        for entry in pending {
            writeln!(f, "- [ ] `{}`", entry.requirement_id)?;
        }

        file_list(f, "Code Files", &report.code_files)?;
        file_list(f, "Test Files", &report.test_files)?;

        if !report.orphan_references.is_empty() {
            f.write_str("\n## Unknown References\n\n")?;
            for orphan in &report.orphan_references {
                writeln!(f, "- `{}` at {}", orphan.id, orphan.location)?;
            }
        }
        Ok(())
    }
}

/// Clean-architecture layer of a code file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Screens and view models
    Presentation,
    /// Models, use cases and repository interfaces
    Domain,
    /// Repository implementations and data sources
    Data,
}

impl Layer {
    /// Outermost first
    pub const ALL: [Self; 3] = [Self::Presentation, Self::Domain, Self::Data];

    /// Directory name marking the layer
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Presentation => "presentation",
            Self::Domain => "domain",
            Self::Data => "data",
        }
    }

    /// Layer of a path: the first directory component naming one
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        path.parent()?.components().find_map(|c| match c {
            Component::Normal(name) => Self::ALL.into_iter().find(|l| name == l.dir_name()),
            _ => None,
        })
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Presentation => "Presentation",
            Self::Domain => "Domain",
            Self::Data => "Data",
        })
    }
}

const LAYER_DIAGRAM: &str = "\
```text
Presentation   Screen, ViewModel
      |
      v
Domain         Models, Use Cases, Repository Interfaces
      |
      v
Data           Repository Implementations, API/DAO, DTOs
```
";

/// Render the layered view of the code files referencing the document
///
/// Code files are grouped by [`Layer::of`]; files outside every layer are
/// listed last under "Other Code" when there are any. Test files are not
/// part of the architecture.
#[must_use]
pub fn render_architecture(report: &SyncReport) -> String {
    Architecture(report).to_string()
}

struct Architecture<'a>(&'a SyncReport);

impl Display for Architecture<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let title = report.feature.as_deref().unwrap_or("Implementation");
        writeln!(f, "# {title} Architecture ({})\n", report.spec_id)?;
        f.write_str("## Layers\n\n")?;
        f.write_str(LAYER_DIAGRAM)?;

        for layer in Layer::ALL {
            let files: Vec<PathBuf> = report
                .code_files
                .iter()
                .filter(|p| Layer::of(p) == Some(layer))
                .cloned()
                .collect();
            file_list(f, &format!("{layer} Layer"), &files)?;
        }
        let other: Vec<PathBuf> = report
            .code_files
            .iter()
            .filter(|p| Layer::of(p).is_none())
            .cloned()
            .collect();
        if !other.is_empty() {
            file_list(f, "Other Code", &other)?;
        }

        f.write_str("\n## Dependency Flow\n\n")?;
        f.write_str("Presentation → Domain → Data (ViewModel → UseCase → Repository).\n")
    }
}

fn join(locations: &[SourceLocation]) -> String {
    locations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn file_list(f: &mut Formatter<'_>, title: &str, files: &[PathBuf]) -> fmt::Result {
    writeln!(f, "\n## {title}\n")?;
    if files.is_empty() {
        f.write_str("_None._\n")?;
    }
    for file in files {
        writeln!(f, "- `{}`", file.to_string_lossy().replace('\\', "/"))?;
    }
    Ok(())
}
