//! New requirements documents
//!
//! [`SpecAuthor`] turns a feature name and a list of free-form requirement
//! lines into a complete document: EARS-classified requirements grouped by
//! kind, matched capabilities, and an all-pending traceability matrix. The
//! rendered text is parsed and validated before it is handed back.

use crate::catalog::Catalog;
use crate::error::AuthorError;
use crate::matcher::{match_text, CapabilityMatch};
use chrono::NaiveDate;
use ignore::WalkBuilder;
use speclink_artifact::{Confidence, RequirementId, RequirementKind, SpecId, TraceabilityEntry};
use speclink_document::{
    classify, render_section_body, split_requirement_line, CoverageCounts, DocumentParser, SpecDocument,
    Validator,
};
use std::fmt::{self, Display, Formatter};
use std::path::Path;

/// Default author when none is given
pub const DEFAULT_AUTHOR: &str = "speclink";

/// Next free document id under `specs_dir`
///
/// Every `*.md` file is considered: its front-matter id when it parses,
/// otherwise a file stem starting with `<prefix>-NNN`. Ids are never
/// reused, so the result is one past the highest number seen. A missing
/// directory yields `<prefix>-001`.
///
/// # Errors
/// - `AuthorError::Walk` / `AuthorError::Io` when the directory cannot be read
pub fn next_spec_id(specs_dir: impl AsRef<Path>, prefix: &str) -> Result<SpecId, AuthorError> {
    let specs_dir = specs_dir.as_ref();
    if !specs_dir.exists() {
        return Ok(SpecId::from_number(prefix, 1));
    }

    let parser = DocumentParser::new();
    let mut highest = 0;
    for entry in WalkBuilder::new(specs_dir).hidden(true).build() {
        let entry = entry?;
        let path = entry.path();
        let is_markdown = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("md"));
        if !is_markdown || !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let text = std::fs::read_to_string(path).map_err(|e| AuthorError::io_error(path, "read", e))?;
        let from_front_matter = parser
            .parse(&text)
            .ok()
            .map(|doc| doc.id().clone())
            .filter(|id| id.is_well_formed(prefix))
            .and_then(|id| id.number());
        let from_stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|stem| stem_number(stem, prefix));
        if let Some(number) = from_front_matter.into_iter().chain(from_stem).max() {
            highest = highest.max(number);
        }
    }

    let next = SpecId::from_number(prefix, highest + 1);
    tracing::debug!(dir = %specs_dir.display(), next = %next, "allocated document id");
    Ok(next)
}

fn stem_number(stem: &str, prefix: &str) -> Option<u32> {
    let rest = stem.strip_prefix(prefix)?.strip_prefix('-')?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() < 3 {
        return None;
    }
    digits.parse().ok()
}

/// Inputs for one new document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpec {
    /// Id to assign (see [`next_spec_id`])
    pub spec_id: SpecId,
    /// Feature name
    pub feature: String,
    /// One-paragraph purpose; defaults to the feature name
    pub purpose: Option<String>,
    /// Free-form requirement lines
    pub raw_requirements: Vec<String>,
    /// Author recorded in the front matter
    pub author: String,
    /// Creation date
    pub date: NaiveDate,
}

impl NewSpec {
    /// Create inputs dated today
    #[must_use]
    pub fn new(spec_id: SpecId, feature: impl Into<String>) -> Self {
        Self {
            spec_id,
            feature: feature.into(),
            purpose: None,
            raw_requirements: Vec::new(),
            author: DEFAULT_AUTHOR.to_string(),
            date: chrono::Local::now().date_naive(),
        }
    }

    /// Set the purpose
    #[must_use]
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Add a requirement line
    #[must_use]
    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.raw_requirements.push(requirement.into());
        self
    }

    /// Set the author
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the date
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }
}

/// A rendered, parsed and validated document
#[derive(Debug, Clone)]
pub struct AuthoredSpec {
    /// Assigned id
    pub spec_id: SpecId,
    /// Document text
    pub text: String,
    /// Parsed form of `text`
    pub document: SpecDocument,
    /// Capabilities recorded in the front matter
    pub matches: Vec<CapabilityMatch>,
    /// Suggested file name, `<id>-<slug>.md`
    pub file_name: String,
}

/// Renders new documents against a capability catalog
#[derive(Debug, Clone, Copy)]
pub struct SpecAuthor<'a> {
    catalog: &'a Catalog,
}

impl<'a> SpecAuthor<'a> {
    /// Create author
    #[inline]
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Render and check a new document
    ///
    /// # Errors
    /// - `AuthorError::EmptyFeature` / `AuthorError::NoRequirements` for empty input
    /// - `AuthorError::Parse` / `AuthorError::Invalid` when the rendered text
    ///   does not round-trip into a valid document
    pub fn create(&self, spec: &NewSpec) -> Result<AuthoredSpec, AuthorError> {
        let feature = one_line(&spec.feature);
        if feature.is_empty() {
            return Err(AuthorError::EmptyFeature);
        }

        let mut grouped: Vec<(RequirementKind, Vec<String>)> =
            RequirementKind::ALL.iter().map(|k| (*k, Vec::new())).collect();
        for raw in &spec.raw_requirements {
            let Some((kind, text)) = ears_sentence(raw) else {
                continue;
            };
            if let Some((_, texts)) = grouped.iter_mut().find(|(k, _)| *k == kind) {
                texts.push(text);
            }
        }
        let texts: Vec<&str> = grouped.iter().flat_map(|(_, t)| t.iter().map(String::as_str)).collect();
        if texts.is_empty() {
            return Err(AuthorError::NoRequirements);
        }

        let matches = match_text(&feature, &texts, self.catalog);
        let purpose = spec.purpose.as_deref().map(one_line).filter(|p| !p.is_empty());
        let text = Rendering {
            spec,
            feature: &feature,
            purpose: purpose.as_deref().unwrap_or(&feature),
            grouped: &grouped,
            matches: &matches,
        }
        .to_string();

        let document = speclink_document::parse(&text)?;
        let report = Validator::new(spec_prefix(&spec.spec_id)).validate(&document);
        if !report.ok {
            let messages: Vec<&str> = report.errors().map(|f| f.message.as_str()).collect();
            return Err(AuthorError::Invalid(messages.join("; ")));
        }

        tracing::info!(
            spec = %spec.spec_id,
            requirements = document.requirements().len(),
            capabilities = matches.len(),
            "document authored"
        );
        Ok(AuthoredSpec {
            spec_id: spec.spec_id.clone(),
            file_name: format!("{}-{}.md", spec.spec_id, slug(&feature)),
            text,
            document,
            matches,
        })
    }
}

/// Rendered text of a new document
struct Rendering<'a> {
    spec: &'a NewSpec,
    feature: &'a str,
    purpose: &'a str,
    grouped: &'a [(RequirementKind, Vec<String>)],
    matches: &'a [CapabilityMatch],
}

impl Display for Rendering<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            spec,
            feature,
            purpose,
            grouped,
            matches,
        } = self;
        f.write_str("---\n")?;
        writeln!(f, "id: {}", spec.spec_id)?;
        writeln!(f, "feature: {feature}")?;
        f.write_str("status: draft\nversion: 1.0.0\n")?;
        writeln!(f, "author: {}", one_line(&spec.author))?;
        writeln!(f, "date: {}", spec.date.format("%Y-%m-%d"))?;
        if matches.is_empty() {
            f.write_str("capabilities: []\n")?;
        } else {
            f.write_str("capabilities:\n")?;
            for m in *matches {
                writeln!(f, "  - {}", m.name())?;
            }
        }
        f.write_str("---\n\n")?;

        writeln!(f, "# {feature} Specification\n")?;
        f.write_str("## 1. Overview\n\n")?;
        writeln!(f, "**Purpose**: {purpose}\n")?;
        f.write_str("---\n\n## 2. Requirements (EARS Format)\n\n")?;

        let mut ids = Vec::new();
        for (index, (kind, texts)) in grouped.iter().enumerate() {
            if texts.is_empty() {
                continue;
            }
            writeln!(f, "### 2.{} {}", index + 1, group_title(*kind))?;
            writeln!(f, "*Format: \"{}\"*\n", format_hint(*kind))?;
            for (seq, text) in (1u32..).zip(texts) {
                let id = RequirementId::new(&spec.spec_id, *kind, seq);
                writeln!(f, "- **{id}**: {text}")?;
                ids.push(id);
            }
            f.write_str("\n")?;
        }

        f.write_str("---\n\n## 3. Capabilities\n\n")?;
        if matches.is_empty() {
            f.write_str("No catalog capability matched.\n\n")?;
        }
        for m in *matches {
            match m.module.description.as_str() {
                "" => writeln!(f, "- `{}`", m.name())?,
                description => writeln!(f, "- `{}`: {description}", m.name())?,
            }
        }
        if !matches.is_empty() {
            f.write_str("\n")?;
        }

        let entries: Vec<TraceabilityEntry> = ids.into_iter().map(TraceabilityEntry::pending).collect();
        f.write_str("---\n\n## 4. Traceability Matrix\n")?;
        f.write_str(&render_section_body(&entries, &CoverageCounts::of(&entries), "", true))
    }
}

/// Classify a raw line, rewording grammar misses as ubiquitous requirements
fn ears_sentence(raw: &str) -> Option<(RequirementKind, String)> {
    let line = one_line(raw);
    let sentence = split_requirement_line(&line).sentence.trim().to_string();
    if sentence.is_empty() {
        return None;
    }
    let classified = classify(&sentence);
    if classified.confidence == Confidence::Matched {
        return Some((classified.kind, classified.text));
    }
    let reworded = classify(&format!("The system shall {}", lower_first(&sentence)));
    Some((reworded.kind, reworded.text))
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn spec_prefix(id: &SpecId) -> &str {
    id.as_str().rsplit_once('-').map_or(id.as_str(), |(prefix, _)| prefix)
}

fn slug(feature: &str) -> String {
    let mut slug = String::new();
    for c in feature.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("feature");
    }
    slug
}

const fn group_title(kind: RequirementKind) -> &'static str {
    match kind {
        RequirementKind::Ubiquitous => "Ubiquitous Requirements",
        RequirementKind::StateDriven => "State-Driven Requirements",
        RequirementKind::EventDriven => "Event-Driven Requirements",
        RequirementKind::Optional => "Optional Requirements",
        RequirementKind::Negative => "Unwanted Behaviors",
    }
}

const fn format_hint(kind: RequirementKind) -> &'static str {
    match kind {
        RequirementKind::Ubiquitous => "The system shall [requirement]",
        RequirementKind::StateDriven => "WHILE [state], the system shall [requirement]",
        RequirementKind::EventDriven => "WHEN [trigger event], the system shall [requirement]",
        RequirementKind::Optional => "WHERE [feature is enabled], the system shall [requirement]",
        RequirementKind::Negative => "IF [condition], THEN the system shall NOT [unwanted behavior]",
    }
}
