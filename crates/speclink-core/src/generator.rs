//! Scaffold generator
//!
//! One file per (entity, role). Each file is a [`RegionedFile`]: a
//! generator-owned header naming the source document and its requirement
//! refs, then the expanded template body, which belongs to the developer
//! from the moment it is written. Regeneration goes through a
//! [`MergeStrategy`](speclink_composition::MergeStrategy) so only headers are
//! ever rewritten.

use crate::entity::derive_entities;
use crate::error::{GenerateError, TemplateError};
use crate::matcher::CapabilityMatch;
use crate::refs::RefSelector;
use crate::templates::{expand, TemplateContext, TemplateRegistry};
use serde::Serialize;
use speclink_artifact::{ContentHash, GeneratedArtifact, Role, WriteOutcome};
use speclink_composition::{strategy_for, HeaderBlock, MergeDecision, RegionedFile, SkipReason};
use speclink_document::SpecDocument;
use std::path::{Path, PathBuf};

/// Where and how to generate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Output root
    pub out_dir: PathBuf,
    /// Package / namespace of generated code
    pub namespace: String,
    /// Replace developer-owned files at generated paths
    pub force: bool,
}

impl GenerateOptions {
    /// Create options (force off)
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            namespace: namespace.into(),
            force: false,
        }
    }

    /// With force flag
    #[inline]
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// A file the generator did not write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipNotice {
    /// No template for the role
    UnknownRole {
        /// Role without a template
        role: Role,
        /// Entity being generated
        entity: String,
    },
    /// Existing file is not generator-owned
    SkippedExisting {
        /// File left alone
        path: PathBuf,
        /// Why
        reason: SkipReason,
    },
}

/// Outcome of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Files produced or confirmed unchanged
    pub artifacts: Vec<GeneratedArtifact>,
    /// Files not produced
    pub skipped: Vec<SkipNotice>,
}

impl GenerationReport {
    /// Number of files whose contents changed on disk
    #[must_use]
    pub fn written(&self) -> usize {
        self.artifacts.iter().filter(|a| a.outcome.wrote()).count()
    }

    /// Artifacts with a given outcome
    pub fn with_outcome(&self, outcome: WriteOutcome) -> impl Iterator<Item = &GeneratedArtifact> {
        self.artifacts.iter().filter(move |a| a.outcome == outcome)
    }
}

/// Expands templates into a layered file set
pub struct Generator<'a> {
    templates: &'a TemplateRegistry,
    selector: &'a dyn RefSelector,
}

impl std::fmt::Debug for Generator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("templates", &self.templates.len())
            .field("selector", &self.selector.name())
            .finish()
    }
}

impl<'a> Generator<'a> {
    /// Create generator over a registry and a ref selector
    #[inline]
    #[must_use]
    pub fn new(templates: &'a TemplateRegistry, selector: &'a dyn RefSelector) -> Self {
        Self { templates, selector }
    }

    /// Generate every (entity, role) file for a document
    ///
    /// Missing templates and developer-owned files are reported in the
    /// result, not raised.
    ///
    /// # Errors
    /// - `GenerateError::Io` for read/write failures (with path and stage)
    /// - `GenerateError::Template` for a template path escaping `out_dir`
    /// - `GenerateError::Region` for an unusable comment prefix
    pub fn generate(
        &self,
        doc: &SpecDocument,
        matches: &[CapabilityMatch],
        options: &GenerateOptions,
    ) -> Result<GenerationReport, GenerateError> {
        let capabilities = capability_names(doc, matches);
        let entities = derive_entities(doc);
        let strategy = strategy_for(options.force);
        let mut report = GenerationReport::default();

        tracing::info!(
            spec = %doc.id(),
            entities = ?entities,
            strategy = strategy.name(),
            selector = self.selector.name(),
            "generating scaffold"
        );

        for entity in &entities {
            let context = TemplateContext {
                entity: entity.clone(),
                namespace: options.namespace.clone(),
                spec_id: doc.id().clone(),
                feature: doc.feature().unwrap_or_default().to_string(),
            };
            for role in Role::ALL {
                let template = match self.templates.lookup(role, &capabilities) {
                    Ok(template) => template,
                    Err(TemplateError::UnknownRole(role)) => {
                        tracing::warn!(%role, entity = %entity, "no template for role");
                        report.skipped.push(SkipNotice::UnknownRole {
                            role,
                            entity: entity.clone(),
                        });
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                let refs = self.selector.select(role, doc.requirements());
                let header = HeaderBlock {
                    spec_id: doc.id().clone(),
                    role,
                    entity: entity.clone(),
                    refs: refs.clone(),
                }
                .render(&template.comment_prefix)?;
                let file = RegionedFile::new(header, expand(&template.body, &context))?;
                let path = options.out_dir.join(template.output_path(&context)?);

                let existing = read_existing(&path)?;
                let decision = strategy.merge(existing.as_deref(), &file);
                let outcome = match decision {
                    MergeDecision::Create(ref text) => Some((WriteOutcome::Created, text.as_str())),
                    MergeDecision::ReplaceHeader(ref text) => Some((WriteOutcome::UpdatedHeader, text.as_str())),
                    MergeDecision::Overwrite(ref text) => Some((WriteOutcome::Overwritten, text.as_str())),
                    MergeDecision::Unchanged => existing
                        .as_deref()
                        .map(|text| (WriteOutcome::Unchanged, text)),
                    MergeDecision::Skip(reason) => {
                        tracing::warn!(path = %path.display(), %reason, "skipping existing file");
                        report.skipped.push(SkipNotice::SkippedExisting { path, reason });
                        continue;
                    }
                };
                let Some((outcome, text)) = outcome else {
                    continue;
                };
                if outcome.wrote() {
                    write_file(&path, text)?;
                }
                tracing::debug!(path = %path.display(), ?outcome, refs = refs.len(), "artifact");

                report.artifacts.push(GeneratedArtifact {
                    role,
                    entity_name: entity.clone(),
                    spec_id: doc.id().clone(),
                    requirement_refs: refs,
                    path,
                    outcome,
                    content_hash: ContentHash::of_text(text),
                });
            }
        }

        tracing::info!(
            spec = %doc.id(),
            artifacts = report.artifacts.len(),
            written = report.written(),
            skipped = report.skipped.len(),
            "scaffold generated"
        );
        Ok(report)
    }
}

// Matched names first, then capabilities declared in the front matter
fn capability_names(doc: &SpecDocument, matches: &[CapabilityMatch]) -> Vec<String> {
    let mut names: Vec<String> = matches.iter().map(|m| m.name().to_string()).collect();
    for declared in doc.capabilities() {
        if !names.contains(&declared) {
            names.push(declared);
        }
    }
    names
}

// Non-UTF-8 files read as empty text: developer-owned
fn read_existing(path: &Path) -> Result<Option<String>, GenerateError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8(bytes).unwrap_or_default())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GenerateError::io_error(path, "read", e)),
    }
}

fn write_file(path: &Path, text: &str) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| GenerateError::io_error(parent, "create_dir", e))?;
    }
    std::fs::write(path, text).map_err(|e| GenerateError::io_error(path, "write", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::TokenOverlapSelector;
    use crate::templates::Template;
    use pretty_assertions::assert_eq;

    const DOC: &str = "---\nid: SPEC-007\nfeature: User Profiles\n---\n## Requirements\n- **REQ-SPEC-007-U-01**: The system shall cache profiles in a local database.\n- **REQ-SPEC-007-U-02**: The system shall display the profile screen.\n";

    fn doc() -> SpecDocument {
        speclink_document::parse(DOC).unwrap()
    }

    fn model_only() -> TemplateRegistry {
        TemplateRegistry::new(vec![Template::new(
            "model",
            Role::Model,
            "{{namespace_path}}/{{entity}}.kt",
            "package {{namespace}}\n\ndata class {{entity}}(val id: String)\n",
        )])
    }

    #[test]
    fn missing_templates_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let registry = model_only();
        let selector = TokenOverlapSelector::new();
        let report = Generator::new(&registry, &selector)
            .generate(&doc(), &[], &GenerateOptions::new(dir.path(), "com.example.app"))
            .unwrap();

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.skipped.len(), Role::ALL.len() - 1);
        assert!(report.skipped.iter().all(|s| matches!(s, SkipNotice::UnknownRole { .. })));

        let text = std::fs::read_to_string(dir.path().join("com/example/app/UserProfile.kt")).unwrap();
        assert_eq!(
            text,
            "// GENERATED-FROM: SPEC-007\n// role: model\n// entity: UserProfile\n// refs: REQ-SPEC-007-U-01\n// END-GENERATED-HEADER\npackage com.example.app\n\ndata class UserProfile(val id: String)\n"
        );
    }

    #[test]
    fn regeneration_keeps_body_and_skips_developer_files() {
        let dir = tempfile::tempdir().unwrap();
        let registry = model_only();
        let selector = TokenOverlapSelector::new();
        let generator = Generator::new(&registry, &selector);
        let options = GenerateOptions::new(dir.path(), "app");
        generator.generate(&doc(), &[], &options).unwrap();

        let path = dir.path().join("app/UserProfile.kt");
        let edited = std::fs::read_to_string(&path)
            .unwrap()
            .replace("(val id: String)", "(val id: String, val name: String)");
        std::fs::write(&path, &edited).unwrap();

        let pick_last = |_: Role, reqs: &[speclink_artifact::Requirement]| -> Vec<speclink_artifact::RequirementId> {
            reqs.iter().rev().take(1).map(|r| r.id.clone()).collect()
        };
        let report = Generator::new(&registry, &pick_last)
            .generate(&doc(), &[], &options)
            .unwrap();
        assert_eq!(report.artifacts[0].outcome, WriteOutcome::UpdatedHeader);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("// refs: REQ-SPEC-007-U-02\n"));
        assert!(text.ends_with("data class UserProfile(val id: String, val name: String)\n"));

        std::fs::write(&path, "class Mine\n").unwrap();
        let report = generator.generate(&doc(), &[], &options).unwrap();
        assert!(report.skipped.iter().any(|s| matches!(
            s,
            SkipNotice::SkippedExisting {
                reason: SkipReason::NotGenerated,
                ..
            }
        )));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "class Mine\n");

        let forced = generator
            .generate(&doc(), &[], &options.clone().with_force(true))
            .unwrap();
        assert_eq!(forced.artifacts[0].outcome, WriteOutcome::Overwritten);
    }

    #[test]
    fn declared_capabilities_select_variants() {
        let raw = DOC.replace("feature: User Profiles\n", "feature: User Profiles\ncapabilities: [android-database-room]\n");
        let doc = speclink_document::parse(&raw).unwrap();
        assert_eq!(capability_names(&doc, &[]), vec!["android-database-room"]);

        let dir = tempfile::tempdir().unwrap();
        let registry = TemplateRegistry::builtin().unwrap();
        let selector = TokenOverlapSelector::new();
        let report = Generator::new(&registry, &selector)
            .generate(&doc, &[], &GenerateOptions::new(dir.path(), "com.example.app"))
            .unwrap();
        assert_eq!(report.artifacts.len(), Role::ALL.len());
        let repository = report
            .artifacts
            .iter()
            .find(|a| a.role == Role::RepositoryImpl)
            .unwrap();
        assert!(std::fs::read_to_string(&repository.path).unwrap().contains("@Dao"));
        assert_eq!(repository.requirement_refs.len(), 1);
    }
}
