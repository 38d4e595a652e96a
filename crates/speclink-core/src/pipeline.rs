//! Pipeline façade
//!
//! Owns the configuration, catalog, template registry and ref selector, and
//! runs the stages in order. Generation and synchronization only proceed
//! when validation reports `ok`; a failed validation comes back as
//! [`Gated::Blocked`] carrying the full report.

use crate::author::{next_spec_id, AuthoredSpec, NewSpec, SpecAuthor};
use crate::catalog::Catalog;
use crate::config::SpeclinkConfig;
use crate::error::{AuthorError, SpeclinkError, SyncError};
use crate::generator::{GenerateOptions, GenerationReport, Generator};
use crate::matcher::{match_capabilities, CapabilityMatch};
use crate::refs::{RefSelector, TokenOverlapSelector};
use crate::summary::{render_architecture, render_status_summary};
use crate::sync::{SyncReport, Synchronizer};
use crate::templates::TemplateRegistry;
use serde::Serialize;
use speclink_artifact::SpecId;
use speclink_document::{DocumentLayer, LoadedDocument, SpecDocument, ValidationReport, Validator};
use std::path::{Path, PathBuf};

/// Result of a stage that requires a valid document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gated<T> {
    /// Validation passed and the stage ran
    Passed {
        /// Validation report (may hold warnings)
        validation: ValidationReport,
        /// Stage output
        output: T,
    },
    /// Validation failed; the stage did not run
    Blocked(ValidationReport),
}

impl<T> Gated<T> {
    /// Validation report either way
    #[must_use]
    pub fn validation(&self) -> &ValidationReport {
        match self {
            Self::Passed { validation, .. } | Self::Blocked(validation) => validation,
        }
    }

    /// Stage output when it ran
    #[must_use]
    pub fn output(&self) -> Option<&T> {
        match self {
            Self::Passed { output, .. } => Some(output),
            Self::Blocked(_) => None,
        }
    }

    /// Whether the stage ran
    #[inline]
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// Result of synchronizing a document file
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// Scan and coverage report
    pub report: SyncReport,
    /// Whether the document file was rewritten
    pub written: bool,
}

/// A document created on disk
#[derive(Debug, Clone)]
pub struct CreatedSpec {
    /// Rendered document
    pub authored: AuthoredSpec,
    /// Where it was written
    pub path: PathBuf,
}

/// Stage runner
pub struct Pipeline {
    config: SpeclinkConfig,
    layer: DocumentLayer,
    validator: Validator,
    catalog: Catalog,
    templates: TemplateRegistry,
    selector: Box<dyn RefSelector>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("spec_prefix", &self.config.spec_prefix)
            .field("capabilities", &self.catalog.len())
            .field("templates", &self.templates.len())
            .field("selector", &self.selector.name())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create pipeline from configuration
    ///
    /// Loads the configured catalog (builtin when none) and layers user
    /// templates over the builtin ones.
    ///
    /// # Errors
    /// - `SpeclinkError::Catalog` / `SpeclinkError::Template` when either cannot be loaded
    pub fn new(config: SpeclinkConfig) -> Result<Self, SpeclinkError> {
        let catalog = match &config.catalog {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin()?,
        };
        let templates = TemplateRegistry::with_user_dir(config.generate.templates_dir.as_deref())?;
        tracing::debug!(
            capabilities = catalog.len(),
            templates = templates.len(),
            "pipeline ready"
        );
        Ok(Self {
            layer: DocumentLayer::with_options(config.parse_options(), config.max_document_bytes),
            validator: Validator::new(config.spec_prefix.clone())
                .with_required_sections(config.required_sections.clone()),
            selector: Box::new(TokenOverlapSelector::new()),
            config,
            catalog,
            templates,
        })
    }

    /// Replace the catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the template registry
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    /// Replace the requirement-ref selector
    #[must_use]
    pub fn with_selector(mut self, selector: impl RefSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SpeclinkConfig {
        &self.config
    }

    /// Catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Generation options rooted at `out_dir` with the configured namespace
    #[must_use]
    pub fn generate_options(&self, out_dir: impl Into<PathBuf>) -> GenerateOptions {
        GenerateOptions::new(out_dir, self.config.generate.namespace.clone())
    }

    /// Read and parse a document file
    ///
    /// # Errors
    /// `SpeclinkError::Document` for I/O, size and malformed front matter.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedDocument, SpeclinkError> {
        Ok(self.layer.read(path)?)
    }

    /// Validate a document
    #[must_use]
    pub fn validate(&self, doc: &SpecDocument) -> ValidationReport {
        let report = self.validator.validate(doc);
        tracing::info!(
            spec = %doc.id(),
            ok = report.ok,
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "document validated"
        );
        report
    }

    /// Rank catalog capabilities against a document
    #[must_use]
    pub fn match_capabilities(&self, doc: &SpecDocument) -> Vec<CapabilityMatch> {
        match_capabilities(doc, &self.catalog)
    }

    /// Validate, match, then write the scaffold
    ///
    /// # Errors
    /// `SpeclinkError::Generate` for file-system failures.
    pub fn generate(
        &self,
        doc: &SpecDocument,
        options: &GenerateOptions,
    ) -> Result<Gated<GenerationReport>, SpeclinkError> {
        let validation = self.validate(doc);
        if !validation.ok {
            return Ok(Gated::Blocked(validation));
        }
        let matches = self.match_capabilities(doc);
        let output = Generator::new(&self.templates, self.selector.as_ref()).generate(doc, &matches, options)?;
        Ok(Gated::Passed { validation, output })
    }

    /// Validate, scan `source_root`, and rewrite the document's traceability section
    ///
    /// With `dry_run` the report is produced but the file is left alone.
    ///
    /// # Errors
    /// - `SpeclinkError::Document` when the document cannot be read or written
    /// - `SpeclinkError::Sync` when the tree cannot be scanned
    pub fn synchronize(
        &self,
        path: impl AsRef<Path>,
        source_root: impl AsRef<Path>,
        dry_run: bool,
    ) -> Result<Gated<SyncOutcome>, SpeclinkError> {
        let path = path.as_ref();
        let loaded = self.load(path)?;
        let validation = self.validate(&loaded.document);
        if !validation.ok {
            return Ok(Gated::Blocked(validation));
        }

        let (updated, report) = Synchronizer::new(&self.config)
            .excluding(path)
            .synchronize(&loaded.document, source_root)?;
        let written = if dry_run {
            tracing::info!(path = %path.display(), "dry run, document not written");
            false
        } else {
            self.layer.write(&updated, path)?
        };
        Ok(Gated::Passed {
            validation,
            output: SyncOutcome { report, written },
        })
    }

    /// Scan `source_root` and report coverage without writing anything
    ///
    /// # Errors
    /// - `SpeclinkError::Document` when the document cannot be read
    /// - `SpeclinkError::Sync` when the tree cannot be scanned
    pub fn verify(&self, path: impl AsRef<Path>, source_root: impl AsRef<Path>) -> Result<SyncReport, SpeclinkError> {
        let path = path.as_ref();
        let loaded = self.load(path)?;
        Ok(Synchronizer::new(&self.config)
            .excluding(path)
            .verify(&loaded.document, source_root)?)
    }

    /// Next free document id in `specs_dir`
    ///
    /// # Errors
    /// `SpeclinkError::Author` when the directory cannot be read.
    pub fn next_spec_id(&self, specs_dir: impl AsRef<Path>) -> Result<SpecId, SpeclinkError> {
        Ok(next_spec_id(specs_dir, &self.config.spec_prefix)?)
    }

    /// Render a new document and write it into `specs_dir`
    ///
    /// # Errors
    /// - `SpeclinkError::Author` for empty input, an invalid rendering, an
    ///   existing target file, or a failed write
    pub fn create(&self, spec: &NewSpec, specs_dir: impl AsRef<Path>) -> Result<CreatedSpec, SpeclinkError> {
        let specs_dir = specs_dir.as_ref();
        let authored = SpecAuthor::new(&self.catalog).create(spec)?;
        let path = specs_dir.join(&authored.file_name);
        if path.exists() {
            return Err(AuthorError::AlreadyExists(path).into());
        }
        std::fs::create_dir_all(specs_dir).map_err(|e| AuthorError::io_error(specs_dir, "create_dir", e))?;
        std::fs::write(&path, &authored.text).map_err(|e| AuthorError::io_error(&path, "write", e))?;
        tracing::info!(path = %path.display(), spec = %authored.spec_id, "document created");
        Ok(CreatedSpec { authored, path })
    }

    /// Make parser-assigned requirement ids durable in the file
    ///
    /// Returns the number of requirement lines rewritten.
    ///
    /// # Errors
    /// `SpeclinkError::Document` when the file cannot be read or written.
    pub fn stamp(&self, path: impl AsRef<Path>) -> Result<usize, SpeclinkError> {
        let path = path.as_ref();
        let mut loaded = self.load(path)?;
        let stamped = loaded.document.stamp_requirement_ids();
        if stamped > 0 {
            self.layer.write(&loaded.document, path)?;
        }
        Ok(stamped)
    }

    /// Write the Markdown status summary of a report
    ///
    /// # Errors
    /// `SpeclinkError::Sync` when the file cannot be written.
    pub fn write_summary(&self, report: &SyncReport, path: impl AsRef<Path>) -> Result<(), SpeclinkError> {
        write_report(path.as_ref(), &render_status_summary(report), "status summary")
    }

    /// Write the layered architecture view of a report
    ///
    /// # Errors
    /// `SpeclinkError::Sync` when the file cannot be written.
    pub fn write_architecture(&self, report: &SyncReport, path: impl AsRef<Path>) -> Result<(), SpeclinkError> {
        write_report(path.as_ref(), &render_architecture(report), "architecture")
    }
}

fn write_report(path: &Path, text: &str, kind: &'static str) -> Result<(), SpeclinkError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SyncError::io_error(parent, "create_dir", e))?;
    }
    std::fs::write(path, text).map_err(|e| SyncError::io_error(path, "write", e))?;
    tracing::info!(path = %path.display(), report = kind, "report written");
    Ok(())
}
