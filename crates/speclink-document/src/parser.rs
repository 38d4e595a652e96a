//! Document parser
//!
//! Splits a document into front matter and ATX-headed sections, locates the
//! requirements and traceability sections by heading text, and classifies
//! every requirement line. Structural problems other than a missing or
//! unterminated front-matter block are left for the validator.

use crate::document::{RequirementSite, Section, SectionRole, SpecDocument};
use crate::error::ParseError;
use crate::frontmatter::FrontMatter;
use crate::grammar::{classify, split_requirement_line};
use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Options, Parser as MdParser, Tag};
use regex::Regex;
use speclink_artifact::{IdSource, Requirement, RequirementId, RequirementKind, SpecId};
use std::collections::BTreeMap;

static NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)*\.?\s+").expect("numbering pattern is valid"));

static TRAILING_PAREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*$").expect("parenthetical pattern is valid"));

/// Heading names the parser looks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Heading texts marking the requirements section
    pub requirements_headings: Vec<String>,
    /// Heading texts marking the traceability section
    pub traceability_headings: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            requirements_headings: vec!["Requirements".to_string()],
            traceability_headings: vec!["Traceability Matrix".to_string()],
        }
    }
}

/// Requirements document parser
#[derive(Debug, Clone, Default)]
pub struct DocumentParser {
    options: ParseOptions,
}

impl DocumentParser {
    /// Create parser with default heading names
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create parser with custom heading names
    #[inline]
    #[must_use]
    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Heading names in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse raw document text
    ///
    /// # Errors
    /// `ParseError::MalformedDocument` when the first line is not `---` or
    /// no closing `---` line follows.
    pub fn parse(&self, raw: &str) -> Result<SpecDocument, ParseError> {
        let text = normalize_line_endings(raw);
        let (fm_block, rest, body_offset) = split_front_matter(&text)?;
        let front_matter = FrontMatter::parse(fm_block);

        let id = front_matter
            .text("id")
            .or_else(|| front_matter.text("spec_id"))
            .map(SpecId::new)
            .unwrap_or_else(|| SpecId::new(""));

        let (preamble, mut sections, starts) = split_sections(rest);
        let requirements_section = sections
            .iter()
            .position(|s| heading_matches(&s.title, &self.options.requirements_headings));
        let traceability_section = sections.iter().enumerate().position(|(i, s)| {
            Some(i) != requirements_section && heading_matches(&s.title, &self.options.traceability_headings)
        });
        // A traceability heading nested under the requirements heading ends that region
        let requirements_end = requirements_section.map(|start| {
            let level = sections[start].level;
            let end = sections[start + 1..]
                .iter()
                .position(|s| s.level <= level)
                .map_or(sections.len(), |offset| start + 1 + offset);
            traceability_section.filter(|&t| t > start && t < end).unwrap_or(end)
        });

        if let (Some(start), Some(end)) = (requirements_section, requirements_end) {
            for section in &mut sections[start..end] {
                section.role = SectionRole::Requirements;
            }
        }
        if let Some(i) = traceability_section {
            sections[i].role = SectionRole::Traceability;
        }

        let lines = LineIndex::new(&text);
        let candidates = match (requirements_section, requirements_end) {
            (Some(start), Some(end)) => collect_candidates(&sections, start..end, |section, line| {
                lines.line_of(body_offset + starts[section] + sections[section].heading.len())
                    + line
            }),
            _ => Vec::new(),
        };
        let (requirements, sites) = assign_ids(&id, candidates);

        tracing::debug!(
            spec = %id,
            sections = sections.len(),
            requirements = requirements.len(),
            "document parsed"
        );

        Ok(SpecDocument {
            id,
            front_matter,
            preamble: preamble.to_string(),
            sections,
            requirements,
            sites,
            requirements_section,
            traceability_section,
        })
    }
}

/// Parse with default heading names
///
/// # Errors
/// See [`DocumentParser::parse`].
pub fn parse(raw: &str) -> Result<SpecDocument, ParseError> {
    DocumentParser::new().parse(raw)
}

/// Replace `\r\n` (and lone `\r`) with `\n`
#[must_use]
pub fn normalize_line_endings(raw: &str) -> String {
    if raw.contains('\r') {
        raw.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        raw.to_string()
    }
}

/// Split into (front-matter block, rest after closing `---`, offset of rest)
fn split_front_matter(text: &str) -> Result<(&str, &str, usize), ParseError> {
    let Some(after_open) = text.strip_prefix("---\n") else {
        return Err(ParseError::malformed("missing front matter: first line must be '---'"));
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches('\n') == "---" {
            let block = &after_open[..offset];
            let rest_start = 4 + offset + 3;
            return Ok((block, &text[rest_start..], rest_start));
        }
        offset += line.len();
    }

    Err(ParseError::malformed("unterminated front matter: no closing '---'"))
}

/// Split the body into preamble and ATX-headed sections
///
/// Returns the sections and each section's byte offset within `body`.
fn split_sections(body: &str) -> (&str, Vec<Section>, Vec<usize>) {
    let mut starts: Vec<usize> = Vec::new();
    for (event, range) in MdParser::new_ext(body, Options::empty()).into_offset_iter() {
        if !matches!(event, Event::Start(Tag::Heading { .. })) {
            continue;
        }
        let line_start = body[..range.start].rfind('\n').map_or(0, |i| i + 1);
        let lead = &body[line_start..range.start];
        let is_atx = lead.chars().all(|c| c == ' ') && is_atx_line(&body[line_start..]);
        if is_atx && starts.last() != Some(&line_start) {
            starts.push(line_start);
        }
    }

    let preamble = &body[..starts.first().copied().unwrap_or(body.len())];
    let mut sections = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(body.len());
        let line_end = body[start..end].find('\n').map_or(end, |n| start + n + 1);
        let heading = &body[start..line_end];
        let (level, title) = read_heading(heading);
        sections.push(Section {
            level,
            title,
            role: SectionRole::Body,
            heading: heading.to_string(),
            body: body[line_end..end].to_string(),
        });
    }
    (preamble, sections, starts)
}

/// `#`…`######` followed by whitespace or end of line
fn is_atx_line(line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes)
        && trimmed[hashes..]
            .chars()
            .next()
            .map_or(true, |c| c == ' ' || c == '\t' || c == '\n')
}

/// Level and text of an ATX heading line
fn read_heading(line: &str) -> (u8, String) {
    let trimmed = line.trim();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    let mut title = trimmed[hashes..].trim();
    // Optional closing sequence: `## Title ##`
    let without_closing = title.trim_end_matches('#');
    if without_closing.len() < title.len() && (without_closing.is_empty() || without_closing.ends_with(' ')) {
        title = without_closing.trim_end();
    }
    (u8::try_from(hashes.min(6)).unwrap_or(6), title.to_string())
}

/// Strip numbering and a trailing parenthetical, then lowercase
#[must_use]
pub fn normalize_heading(title: &str) -> String {
    let title = NUMBERING.replace(title.trim(), "");
    let title = TRAILING_PAREN.replace(&title, "");
    title.trim().to_lowercase()
}

fn heading_matches(title: &str, names: &[String]) -> bool {
    let normalized = normalize_heading(title);
    names.iter().any(|name| normalized == name.trim().to_lowercase())
}

/// Byte offset → 1-based line number
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }
}

/// A line that will become a requirement
struct Candidate {
    line: usize,
    site: RequirementSite,
    declared: Option<String>,
    kind: RequirementKind,
    text: String,
    confidence: speclink_artifact::Confidence,
}

/// Line-level filter state across the requirements region
#[derive(Default)]
struct LineFilter {
    in_fence: bool,
    in_comment: bool,
}

impl LineFilter {
    /// Whether a line is requirement text
    fn accepts(&mut self, line: &str) -> bool {
        let t = line.trim();
        if self.in_comment {
            if t.contains("-->") {
                self.in_comment = false;
            }
            return false;
        }
        if t.starts_with("```") || t.starts_with("~~~") {
            self.in_fence = !self.in_fence;
            return false;
        }
        if self.in_fence || t.is_empty() {
            return false;
        }
        if t.starts_with("<!--") {
            self.in_comment = !t.contains("-->");
            return false;
        }
        !(t.starts_with('#') || t.starts_with('>') || is_thematic_break(t) || is_annotation(t))
    }
}

fn is_thematic_break(t: &str) -> bool {
    let marks: Vec<char> = t.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3
        && matches!(marks[0], '-' | '*' | '_')
        && marks.iter().all(|c| *c == marks[0])
}

/// A line wholly wrapped in single emphasis, e.g. `*Format: …*`
fn is_annotation(t: &str) -> bool {
    ['*', '_'].iter().any(|&mark| {
        let double: String = [mark, mark].iter().collect();
        t.len() >= 3
            && t.starts_with(mark)
            && t.ends_with(mark)
            && !t.starts_with(&double)
            && !t.ends_with(&double)
            && !t[1..].starts_with(' ')
    })
}

fn collect_candidates(
    sections: &[Section],
    region: std::ops::Range<usize>,
    line_number: impl Fn(usize, usize) -> usize,
) -> Vec<Candidate> {
    let mut filter = LineFilter::default();
    let mut out = Vec::new();
    for index in region {
        for (line_in_body, line) in sections[index].body.split_inclusive('\n').enumerate() {
            if !filter.accepts(line) {
                continue;
            }
            let parts = split_requirement_line(line);
            let classification = classify(parts.sentence);
            out.push(Candidate {
                line: line_number(index, line_in_body),
                site: RequirementSite {
                    section: index,
                    line_in_body,
                },
                declared: parts.declared_id.map(str::to_string),
                kind: classification.kind,
                text: classification.text,
                confidence: classification.confidence,
            });
        }
    }
    out
}

/// Keep declared ids whose kind still matches; assign the rest
///
/// New sequence numbers continue after the highest number of that kind
/// already declared in the section, so ids are never reused.
fn assign_ids(spec: &SpecId, candidates: Vec<Candidate>) -> (Vec<Requirement>, Vec<RequirementSite>) {
    let mut next: BTreeMap<RequirementKind, u32> = BTreeMap::new();
    for candidate in &candidates {
        if let Some(parts) = candidate
            .declared
            .as_deref()
            .and_then(|raw| RequirementId::raw(raw).parts())
        {
            let slot = next.entry(parts.kind).or_insert(0);
            *slot = (*slot).max(parts.seq);
        }
    }

    let mut requirements = Vec::with_capacity(candidates.len());
    let mut sites = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let declared = candidate.declared.map(RequirementId::raw);
        let declared_kind = declared.as_ref().map(|id| id.parts().map(|p| p.kind));

        let (id, id_source, previous_id) = match (declared, declared_kind) {
            // Well-formed and kind unchanged, or malformed: keep verbatim
            (Some(id), Some(Some(kind))) if kind == candidate.kind => (id, IdSource::Declared, None),
            (Some(id), Some(None)) => (id, IdSource::Declared, None),
            (previous, _) => {
                let seq = next.entry(candidate.kind).or_insert(0);
                *seq += 1;
                (RequirementId::new(spec, candidate.kind, *seq), IdSource::Assigned, previous)
            }
        };

        requirements.push(Requirement {
            id,
            kind: candidate.kind,
            text: candidate.text,
            confidence: candidate.confidence,
            line: candidate.line,
            previous_id,
            id_source,
        });
        sites.push(candidate.site);
    }
    (requirements, sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use speclink_artifact::Confidence;

    fn doc(body: &str) -> String {
        format!("---\nid: SPEC-007\nfeature: Email signup\nstatus: draft\n---\n{body}")
    }

    #[test]
    fn single_ubiquitous_requirement() {
        let parsed = parse(&doc("\n## Requirements\n\nThe system shall validate an email address.\n")).unwrap();
        let reqs = parsed.requirements();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].id.as_str(), "REQ-SPEC-007-U-01");
        assert_eq!(reqs[0].kind, RequirementKind::Ubiquitous);
        assert_eq!(reqs[0].id_source, IdSource::Assigned);
        assert_eq!(reqs[0].line, 9);
    }

    #[test]
    fn event_requirement() {
        let parsed = parse(&doc(
            "## Requirements\nWHEN user submits form, the system shall persist the record.\n",
        ))
        .unwrap();
        assert_eq!(parsed.requirements()[0].kind, RequirementKind::EventDriven);
        assert!(parsed.requirements()[0].id.as_str().ends_with("-E-01"));
    }

    #[test]
    fn missing_front_matter() {
        let err = parse("# Title\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedDocument { .. }));
    }

    #[test]
    fn unterminated_front_matter() {
        let err = parse("---\nid: SPEC-001\n# Title\n").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn legacy_keys_and_numbered_heading() {
        let raw = "---\nspec_id: SPEC-001\nfeature: Login\nrelated_skills:\n  - auth\n---\n\n## 2. Requirements (EARS Format)\n\n### 2.1 Ubiquitous Requirements (Core Functionality)\n*Format: \"The system shall [requirement]\"*\n\n- **REQ-001-U-01**: The system shall log in.\n\n---\n\n## 3. User Stories\n\nThe system shall not be parsed here.\n";
        let parsed = parse(raw).unwrap();
        assert_eq!(parsed.id().as_str(), "SPEC-001");
        assert_eq!(parsed.capabilities(), ["auth"]);
        assert_eq!(parsed.requirements().len(), 1);
        assert_eq!(parsed.requirements()[0].id.as_str(), "REQ-001-U-01");
        assert_eq!(parsed.requirements()[0].id_source, IdSource::Declared);
        assert_eq!(parsed.serialize(), raw);
    }

    #[test]
    fn heading_in_code_fence_is_not_a_section() {
        let raw = doc("## Overview\n```\n## Requirements\n```\n## Requirements\nThe system shall run.\n");
        let parsed = parse(&raw).unwrap();
        assert_eq!(parsed.sections().len(), 2);
        assert_eq!(parsed.requirements().len(), 1);
        assert_eq!(parsed.serialize(), raw);
    }

    #[test]
    fn excluded_lines_in_region() {
        let raw = doc("## Requirements\n> note\n<!-- hidden\nThe system shall hide.\n-->\n```\nThe system shall be code.\n```\n***\n_annotation_\nThe system shall count.\n");
        let parsed = parse(&raw).unwrap();
        let texts: Vec<_> = parsed.requirements().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["The system shall count."]);
    }

    #[test]
    fn new_ids_continue_after_declared_max() {
        let raw = doc("## Requirements\n- **REQ-SPEC-007-U-03**: The system shall a.\n- The system shall b.\n");
        let parsed = parse(&raw).unwrap();
        let ids: Vec<_> = parsed.requirements().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["REQ-SPEC-007-U-03", "REQ-SPEC-007-U-04"]);
    }

    #[test]
    fn reclassified_requirement_gets_new_id() {
        let raw = doc("## Requirements\n- **REQ-SPEC-007-U-01**: WHEN x happens, the system shall y.\n- **REQ-SPEC-007-E-02**: WHEN a, the system shall b.\n");
        let parsed = parse(&raw).unwrap();
        let first = &parsed.requirements()[0];
        assert_eq!(first.kind, RequirementKind::EventDriven);
        assert_eq!(first.id.as_str(), "REQ-SPEC-007-E-03");
        assert_eq!(first.previous_id.as_ref().map(RequirementId::as_str), Some("REQ-SPEC-007-U-01"));
        assert_eq!(parsed.requirements()[1].id.as_str(), "REQ-SPEC-007-E-02");
    }

    #[test]
    fn malformed_id_is_kept() {
        let parsed = parse(&doc("## Requirements\n- **REQ-BAD**: The system shall a.\n")).unwrap();
        assert_eq!(parsed.requirements()[0].id.as_str(), "REQ-BAD");
    }

    #[test]
    fn fallback_line_still_counts() {
        let parsed = parse(&doc("## Requirements\nUsers like it.\n")).unwrap();
        assert_eq!(parsed.requirements()[0].confidence, Confidence::Fallback);
    }

    #[test]
    fn crlf_is_normalized() {
        let parsed = parse("---\r\nid: SPEC-001\r\n---\r\n## Requirements\r\nThe system shall a.\r\n").unwrap();
        assert_eq!(parsed.requirements()[0].text, "The system shall a.");
        assert_eq!(parsed.serialize(), "---\nid: SPEC-001\n---\n## Requirements\nThe system shall a.\n");
    }

    #[test]
    fn traceability_section_located() {
        let raw = doc("## Requirements\nThe system shall a.\n## 7. Traceability Matrix\n\n| Requirement | Code File | Test File | Status |\n");
        let parsed = parse(&raw).unwrap();
        assert_eq!(parsed.traceability_section().map(|s| s.level), Some(2));
        assert_eq!(parsed.requirements().len(), 1);
    }

    #[test]
    fn nested_traceability_heading_ends_requirements() {
        let raw = doc("## Requirements\n- **REQ-SPEC-007-U-01**: The system shall a.\n### Traceability Matrix\n\n| Requirement | Code File | Test File | Status |\n|---|---|---|---|\n| REQ-SPEC-007-U-01 | — | — | ⏳ Pending |\n## Notes\n");
        let parsed = parse(&raw).unwrap();
        let section = parsed.traceability_section().unwrap();
        assert_eq!(section.level, 3);
        assert_eq!(section.role, SectionRole::Traceability);
        assert_eq!(parsed.requirements().len(), 1);
        assert_eq!(parsed.requirements()[0].line, 7);
    }

    #[test]
    fn stamp_makes_ids_durable() {
        let raw = doc("## Requirements\n  * The system shall a.\nWHEN b, the system shall c.\n");
        let mut parsed = parse(&raw).unwrap();
        assert_eq!(parsed.stamp_requirement_ids(), 2);
        let text = parsed.serialize();
        assert!(text.contains("  - **REQ-SPEC-007-U-01**: The system shall a.\n"));
        assert!(text.contains("- **REQ-SPEC-007-E-01**: WHEN b, the system shall c.\n"));

        let mut reparsed = parse(&text).unwrap();
        assert!(reparsed.requirements().iter().all(|r| r.id_source == IdSource::Declared));
        assert_eq!(reparsed.stamp_requirement_ids(), 0);
    }

    #[test]
    fn normalize_heading_strips_decoration() {
        assert_eq!(normalize_heading("2. Requirements (EARS Format)"), "requirements");
        assert_eq!(normalize_heading("7 Traceability Matrix"), "traceability matrix");
        assert_eq!(normalize_heading("2.1 Ubiquitous"), "ubiquitous");
    }

    #[test]
    fn closing_hashes_removed() {
        assert_eq!(read_heading("## Requirements ##\n"), (2, "Requirements".to_string()));
        assert_eq!(read_heading("# C#\n"), (1, "C#".to_string()));
    }

    #[test]
    fn document_without_body() {
        let raw = "---\nid: SPEC-001\n---";
        let parsed = parse(raw).unwrap();
        assert!(parsed.sections().is_empty());
        assert_eq!(parsed.serialize(), raw);
    }
}
