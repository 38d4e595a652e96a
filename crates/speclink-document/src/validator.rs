//! Document validator
//!
//! Checks a parsed document against structural rules. Never fails: every
//! problem becomes a [`Finding`], and the report is `ok` iff no finding has
//! error severity.

use crate::document::SpecDocument;
use crate::parser::normalize_heading;
use crate::table::parse_table;
use serde::Serialize;
use speclink_artifact::SpecStatus;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

/// Metadata fields expected besides id and status
const EXPECTED_FIELDS: [&str; 2] = ["feature", "version"];

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Advisory; never blocks later stages
    Warning,
    /// Blocks generation and synchronization
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Stable finding code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCode {
    /// No `id` / `spec_id` in front matter
    MissingSpecId,
    /// Id does not match `PREFIX-NNN`
    InvalidSpecId,
    /// Requirements section empty or absent
    NoRequirements,
    /// Requirement id not `REQ-<spec>-<kind>-<seq>`
    MalformedRequirementId,
    /// Same requirement id used twice
    DuplicateRequirementId,
    /// Status outside draft/approved/implemented
    UnknownStatus,
    /// No status field
    MissingStatus,
    /// No traceability section yet
    MissingTraceabilitySection,
    /// Traceability section does not hold a readable table
    MalformedTraceabilitySection,
    /// Expected metadata field absent
    MissingMetadataField,
    /// Requirement id embeds another document's id
    ForeignRequirementId,
    /// Declared id replaced because the sentence changed kind
    RequirementReclassified,
    /// Sentence matched no grammar rule
    UnclassifiedRequirement,
    /// Configured required section absent
    MissingSection,
}

impl FindingCode {
    /// Snake-case code string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingSpecId => "missing_spec_id",
            Self::InvalidSpecId => "invalid_spec_id",
            Self::NoRequirements => "no_requirements",
            Self::MalformedRequirementId => "malformed_requirement_id",
            Self::DuplicateRequirementId => "duplicate_requirement_id",
            Self::UnknownStatus => "unknown_status",
            Self::MissingStatus => "missing_status",
            Self::MissingTraceabilitySection => "missing_traceability_section",
            Self::MalformedTraceabilitySection => "malformed_traceability_section",
            Self::MissingMetadataField => "missing_metadata_field",
            Self::ForeignRequirementId => "foreign_requirement_id",
            Self::RequirementReclassified => "requirement_reclassified",
            Self::UnclassifiedRequirement => "unclassified_requirement",
            Self::MissingSection => "missing_section",
        }
    }
}

impl Display for FindingCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Severity
    pub severity: Severity,
    /// Stable code
    pub code: FindingCode,
    /// Human-readable message
    pub message: String,
    /// Document line, when the finding concerns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Finding {
    fn error(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            line: None,
        }
    }

    fn warning(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            line: None,
        }
    }

    fn at(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} [{}] line {line}: {}", self.severity, self.code, self.message),
            None => write!(f, "{} [{}]: {}", self.severity, self.code, self.message),
        }
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// No error-severity findings
    pub ok: bool,
    /// Findings in check order
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    fn from_findings(findings: Vec<Finding>) -> Self {
        let ok = findings.iter().all(|f| f.severity != Severity::Error);
        Self { ok, findings }
    }

    /// Error findings
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    /// Warning findings
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    /// Whether any finding has this code
    #[must_use]
    pub fn has(&self, code: FindingCode) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }
}

/// Structural validator
#[derive(Debug, Clone)]
pub struct Validator {
    spec_prefix: String,
    required_sections: Vec<String>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new("SPEC")
    }
}

impl Validator {
    /// Create validator expecting ids of the form `<prefix>-NNN`
    #[must_use]
    pub fn new(spec_prefix: impl Into<String>) -> Self {
        Self {
            spec_prefix: spec_prefix.into(),
            required_sections: Vec::new(),
        }
    }

    /// Also warn when a section with one of these headings is absent
    ///
    /// Headings compare after numbering and a trailing parenthetical are
    /// stripped, so `2. Requirements (EARS Format)` satisfies `Requirements`.
    #[must_use]
    pub fn with_required_sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_sections = sections.into_iter().map(Into::into).collect();
        self
    }

    /// Validate a document
    #[must_use]
    pub fn validate(&self, doc: &SpecDocument) -> ValidationReport {
        let mut findings = Vec::new();
        self.check_id(doc, &mut findings);
        check_requirements(doc, &mut findings);
        check_metadata(doc, &mut findings);
        check_traceability(doc, &mut findings);
        self.check_sections(doc, &mut findings);

        let report = ValidationReport::from_findings(findings);
        tracing::debug!(
            spec = %doc.id(),
            ok = report.ok,
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "document validated"
        );
        report
    }

    fn check_id(&self, doc: &SpecDocument, findings: &mut Vec<Finding>) {
        let id = doc.id();
        if id.is_empty() {
            findings.push(Finding::error(
                FindingCode::MissingSpecId,
                "front matter has no 'id' field",
            ));
        } else if !id.is_well_formed(&self.spec_prefix) {
            findings.push(Finding::error(
                FindingCode::InvalidSpecId,
                format!("'{id}' does not match {}-NNN", self.spec_prefix),
            ));
        }
    }

    fn check_sections(&self, doc: &SpecDocument, findings: &mut Vec<Finding>) {
        let present: HashSet<String> = doc.sections().iter().map(|s| normalize_heading(&s.title)).collect();
        for name in &self.required_sections {
            if !present.contains(&normalize_heading(name)) {
                findings.push(Finding::warning(
                    FindingCode::MissingSection,
                    format!("no '{}' section", name.trim()),
                ));
            }
        }
    }
}

/// Validate with the default `SPEC` prefix
#[must_use]
pub fn validate(doc: &SpecDocument) -> ValidationReport {
    Validator::default().validate(doc)
}

fn check_requirements(doc: &SpecDocument, findings: &mut Vec<Finding>) {
    if doc.requirements().is_empty() {
        findings.push(Finding::error(FindingCode::NoRequirements, "no requirements found"));
        return;
    }

    let own = doc.id().as_str();
    let own_number = own.rsplit_once('-').map(|(_, n)| n);
    let mut seen = HashSet::new();

    for req in doc.requirements() {
        match req.id.parts() {
            None => findings.push(
                Finding::error(
                    FindingCode::MalformedRequirementId,
                    format!("'{}' is not of the form REQ-<spec>-<kind>-<seq>", req.id),
                )
                .at(req.line),
            ),
            Some(parts) if !own.is_empty() && parts.spec != own && Some(parts.spec.as_str()) != own_number => {
                findings.push(
                    Finding::warning(
                        FindingCode::ForeignRequirementId,
                        format!("'{}' refers to {} rather than {own}", req.id, parts.spec),
                    )
                    .at(req.line),
                );
            }
            Some(_) => {}
        }

        if !seen.insert(req.id.as_str()) {
            findings.push(
                Finding::error(
                    FindingCode::DuplicateRequirementId,
                    format!("'{}' is used more than once", req.id),
                )
                .at(req.line),
            );
        }

        if let Some(previous) = &req.previous_id {
            findings.push(
                Finding::warning(
                    FindingCode::RequirementReclassified,
                    format!("'{previous}' now reads as kind {}; renumbered to '{}'", req.kind, req.id),
                )
                .at(req.line),
            );
        }

        if req.is_fallback() {
            findings.push(
                Finding::warning(
                    FindingCode::UnclassifiedRequirement,
                    format!("'{}' matches no EARS pattern; treated as ubiquitous", req.id),
                )
                .at(req.line),
            );
        }
    }
}

fn check_metadata(doc: &SpecDocument, findings: &mut Vec<Finding>) {
    match doc.status_text() {
        None => findings.push(Finding::warning(FindingCode::MissingStatus, "front matter has no 'status' field")),
        Some(raw) if raw.parse::<SpecStatus>().is_err() => findings.push(Finding::warning(
            FindingCode::UnknownStatus,
            format!("status '{raw}' is not one of draft, approved, implemented"),
        )),
        Some(_) => {}
    }

    for field in EXPECTED_FIELDS {
        if doc.front_matter().text(field).is_none() {
            findings.push(Finding::warning(
                FindingCode::MissingMetadataField,
                format!("front matter has no '{field}' field"),
            ));
        }
    }
}

fn check_traceability(doc: &SpecDocument, findings: &mut Vec<Finding>) {
    match doc.traceability_section() {
        None => findings.push(Finding::warning(
            FindingCode::MissingTraceabilitySection,
            "no traceability section; it will be created on the next sync",
        )),
        Some(section) => {
            if let Err(err) = parse_table(section.body()) {
                findings.push(Finding::warning(
                    FindingCode::MalformedTraceabilitySection,
                    format!("traceability table unreadable ({err}); it will be rewritten on the next sync"),
                ));
            }
        }
    }
}
