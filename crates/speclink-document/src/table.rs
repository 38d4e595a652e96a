//! Traceability table codec
//!
//! The traceability section is machine-owned. Its body is a four-column
//! Markdown table followed by a coverage line and a legend:
//!
//! ```text
//! | Requirement | Code File | Test File | Status |
//! |-------------|-----------|-----------|--------|
//! | REQ-SPEC-007-U-01 | src/a.kt:12 | — | 🟢 Implemented |
//!
//! **Coverage**: 1/1 (100.0%) · Tested: 0/1 (0.0%)
//!
//! **Legend**: ⏳ Pending | 🟢 Implemented | ✅ Tested
//! ```

use crate::error::TableError;
use serde::Serialize;
use speclink_artifact::{TraceStatus, TraceabilityEntry};
use std::fmt::{self, Display, Formatter};

const HEADER: [&str; 4] = ["Requirement", "Code File", "Test File", "Status"];
const EMPTY_CELL: &str = "—";
const COVERAGE_PREFIX: &str = "**Coverage**";
const LEGEND_PREFIX: &str = "**Legend**";

/// One row read back from a rendered table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRow {
    /// Requirement id cell
    pub requirement_id: String,
    /// Code locations
    pub code: Vec<String>,
    /// Test locations
    pub tests: Vec<String>,
    /// Status keyword
    pub status: TraceStatus,
}

/// Status counts over a set of entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageCounts {
    /// Requirements with no code reference
    pub pending: usize,
    /// Requirements referenced from code only
    pub implemented: usize,
    /// Requirements referenced from code and tests
    pub tested: usize,
}

impl CoverageCounts {
    /// Count statuses
    #[must_use]
    pub fn of(entries: &[TraceabilityEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut counts, entry| {
            match entry.status {
                TraceStatus::Pending => counts.pending += 1,
                TraceStatus::Implemented => counts.implemented += 1,
                TraceStatus::Tested => counts.tested += 1,
            }
            counts
        })
    }

    /// Number of requirements
    #[inline]
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.implemented + self.tested
    }

    /// Requirements with status other than pending
    #[inline]
    #[must_use]
    pub const fn covered(&self) -> usize {
        self.implemented + self.tested
    }

    /// `covered / total`, `0.0` for an empty set
    #[must_use]
    pub fn coverage(&self) -> f64 {
        ratio(self.covered(), self.total())
    }

    /// `tested / total`, `0.0` for an empty set
    #[must_use]
    pub fn tested_coverage(&self) -> f64 {
        ratio(self.tested, self.total())
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Render the table, coverage line and legend (newline-terminated)
#[must_use]
pub fn render_table(entries: &[TraceabilityEntry], counts: &CoverageCounts) -> String {
    Table { entries, counts }.to_string()
}

struct Table<'a> {
    entries: &'a [TraceabilityEntry],
    counts: &'a CoverageCounts,
}

impl Display for Table<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "| {} |", HEADER.join(" | "))?;
        let rule: Vec<String> = HEADER.iter().map(|h| "-".repeat(h.len() + 2)).collect();
        writeln!(f, "|{}|", rule.join("|"))?;
        for entry in self.entries {
            writeln!(
                f,
                "| {} | {} | {} | {} |",
                entry.requirement_id,
                join_locations(&entry.code_locations),
                join_locations(&entry.test_locations),
                entry.status.badge()
            )?;
        }
        writeln!(f, "\n{}\n", coverage_line(self.counts))?;
        writeln!(
            f,
            "{LEGEND_PREFIX}: {} | {} | {}",
            TraceStatus::Pending.badge(),
            TraceStatus::Implemented.badge(),
            TraceStatus::Tested.badge()
        )
    }
}

/// `**Coverage**: 1/2 (50.0%) · Tested: 0/2 (0.0%)`
#[must_use]
pub fn coverage_line(counts: &CoverageCounts) -> String {
    format!(
        "{COVERAGE_PREFIX}: {}/{} ({:.1}%) · Tested: {}/{} ({:.1}%)",
        counts.covered(),
        counts.total(),
        counts.coverage() * 100.0,
        counts.tested,
        counts.total(),
        counts.tested_coverage() * 100.0
    )
}

fn join_locations<T: ToString>(locations: &[T]) -> String {
    if locations.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("<br>")
    }
}

/// Read the first table in a section body
///
/// # Errors
/// Returns [`TableError`] when no table exists, the header or separator is
/// wrong, or a row has the wrong shape or an unknown status.
pub fn parse_table(body: &str) -> Result<Vec<TraceRow>, TableError> {
    let mut rows = body
        .lines()
        .map(str::trim)
        .skip_while(|line| !line.starts_with('|'))
        .take_while(|line| line.starts_with('|'));

    let header = rows.next().ok_or(TableError::MissingTable)?;
    let header_cells = cells(header);
    let header_ok = header_cells.len() == HEADER.len()
        && header_cells
            .iter()
            .zip(HEADER)
            .all(|(cell, expected)| cell.eq_ignore_ascii_case(expected));
    if !header_ok {
        return Err(TableError::BadHeader(header.to_string()));
    }

    let separator = rows.next().ok_or(TableError::MissingSeparator)?;
    let separator_ok = cells(separator).iter().all(|cell| {
        let inner = cell.trim_start_matches(':').trim_end_matches(':');
        !inner.is_empty() && inner.chars().all(|c| c == '-')
    });
    if !separator_ok {
        return Err(TableError::MissingSeparator);
    }

    rows.enumerate()
        .map(|(i, line)| parse_row(i + 1, line))
        .collect()
}

fn parse_row(row: usize, line: &str) -> Result<TraceRow, TableError> {
    let cells = cells(line);
    let [id, code, tests, status] = cells.as_slice() else {
        return Err(TableError::bad_row(row, format!("expected 4 cells, found {}", cells.len())));
    };
    let requirement_id = id.trim_matches(|c| c == '*' || c == '`').trim().to_string();
    if requirement_id.is_empty() {
        return Err(TableError::bad_row(row, "empty requirement cell"));
    }
    let status = parse_status(status)
        .ok_or_else(|| TableError::bad_row(row, format!("unknown status '{status}'")))?;
    Ok(TraceRow {
        requirement_id,
        code: split_locations(code),
        tests: split_locations(tests),
        status,
    })
}

fn cells(line: &str) -> Vec<&str> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

/// Status by keyword, emoji ignored
fn parse_status(cell: &str) -> Option<TraceStatus> {
    let lower = cell.to_lowercase();
    if lower.contains("tested") {
        Some(TraceStatus::Tested)
    } else if lower.contains("implemented") {
        Some(TraceStatus::Implemented)
    } else if lower.contains("pending") {
        Some(TraceStatus::Pending)
    } else {
        None
    }
}

fn split_locations(cell: &str) -> Vec<String> {
    cell.replace("<br/>", "<br>")
        .replace("<br />", "<br>")
        .split("<br>")
        .map(str::trim)
        .filter(|loc| !matches!(*loc, "" | "—" | "-" | "[TBD]" | "TBD"))
        .map(str::to_string)
        .collect()
}

/// A traceability section body split into what the machine owns and what not
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionContent {
    /// Non-blank lines that are not part of the table, coverage or legend
    pub manual_lines: Vec<String>,
    /// Trailing blank lines and thematic breaks, kept on rewrite
    pub tail: String,
}

/// Separate manual lines and the trailing separator from a section body
#[must_use]
pub fn split_section(body: &str) -> SectionContent {
    let lines: Vec<&str> = body.split_inclusive('\n').collect();
    let tail_start = lines
        .iter()
        .rposition(|line| !is_tail_line(line))
        .map_or(0, |i| i + 1);

    let manual_lines = lines[..tail_start]
        .iter()
        .map(|line| line.trim())
        .filter(|line| {
            !(line.is_empty()
                || line.starts_with('|')
                || line.starts_with(COVERAGE_PREFIX)
                || line.starts_with(LEGEND_PREFIX))
        })
        .map(str::to_string)
        .collect();

    SectionContent {
        manual_lines,
        tail: lines[tail_start..].concat(),
    }
}

fn is_tail_line(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || (t.len() >= 3 && t.chars().all(|c| c == '-'))
}

/// Full section body: blank line, table block, then the kept tail
///
/// An empty tail becomes a single blank line unless the section ends the
/// document.
#[must_use]
pub fn render_section_body(
    entries: &[TraceabilityEntry],
    counts: &CoverageCounts,
    tail: &str,
    is_last: bool,
) -> String {
    let mut body = String::from("\n");
    body.push_str(&render_table(entries, counts));
    if tail.is_empty() && !is_last {
        body.push('\n');
    } else {
        body.push_str(tail);
    }
    body
}
