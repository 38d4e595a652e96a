//! Configuration
//!
//! `speclink.toml`, every field optional:
//!
//! ```toml
//! spec_prefix = "SPEC"
//! requirements_headings = ["Requirements"]
//! traceability_headings = ["Traceability Matrix"]
//! traceability_heading_level = 2
//! required_sections = ["Overview", "User Stories"]
//! catalog = "catalog.yaml"
//!
//! [scan]
//! test_dirs = ["test", "tests", "androidTest", "__tests__"]
//! extensions = ["kt", "kts"]
//! count_generated_headers = false
//!
//! [generate]
//! namespace = "com.example.app"
//! templates_dir = "templates"
//! ```
//!
//! Relative `catalog` and `templates_dir` paths resolve against the config
//! file's directory.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use speclink_document::{ParseOptions, DEFAULT_MAX_DOCUMENT_BYTES};
use std::path::{Path, PathBuf};

/// Config file name looked up by [`SpeclinkConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "speclink.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeclinkConfig {
    /// Spec id prefix (`SPEC` in `SPEC-007`)
    pub spec_prefix: String,
    /// Heading texts marking the requirements section
    pub requirements_headings: Vec<String>,
    /// Heading texts marking the traceability section
    pub traceability_headings: Vec<String>,
    /// Heading level used when the traceability section is created
    pub traceability_heading_level: u8,
    /// Headings the validator warns about when absent
    pub required_sections: Vec<String>,
    /// Source scanning
    pub scan: ScanConfig,
    /// Scaffold generation
    pub generate: GenerateConfig,
    /// Capability catalog (YAML or JSON); builtin when absent
    pub catalog: Option<PathBuf>,
    /// Largest document the file layer reads
    pub max_document_bytes: usize,
}

impl SpeclinkConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With spec id prefix
    #[inline]
    #[must_use]
    pub fn with_spec_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.spec_prefix = prefix.into();
        self
    }

    /// With generated-code namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.generate.namespace = namespace.into();
        self
    }

    /// With user templates directory
    #[inline]
    #[must_use]
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.generate.templates_dir = Some(dir.into());
        self
    }

    /// With catalog file
    #[inline]
    #[must_use]
    pub fn with_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog = Some(path.into());
        self
    }

    /// With scan settings
    #[inline]
    #[must_use]
    pub fn with_scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Heading names for the document parser
    #[must_use]
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            requirements_headings: self.requirements_headings.clone(),
            traceability_headings: self.traceability_headings.clone(),
        }
    }

    /// Title used when the traceability section has to be created
    #[must_use]
    pub fn traceability_title(&self) -> &str {
        self.traceability_headings
            .first()
            .map_or("Traceability Matrix", String::as_str)
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` when the text is not valid for this schema.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(CONFIG_FILE_NAME),
            source,
        })
    }

    /// Load a config file
    ///
    /// # Errors
    /// `ConfigError::Io` if unreadable, `ConfigError::Parse` if invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Find `speclink.toml` in `start` or an ancestor; defaults when none
    ///
    /// # Errors
    /// Propagates [`load`](Self::load) errors for a file that exists.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let start = start.as_ref();
        let absolute = if start.is_absolute() {
            start.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(start))
                .unwrap_or_else(|_| start.to_path_buf())
        };
        for dir in absolute.ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load(candidate);
            }
        }
        Ok(Self::default())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        if let Some(catalog) = self.catalog.as_mut().filter(|p| p.is_relative()) {
            *catalog = base.join(&*catalog);
        }
        if let Some(dir) = self.generate.templates_dir.as_mut().filter(|p| p.is_relative()) {
            *dir = base.join(&*dir);
        }
    }
}

impl Default for SpeclinkConfig {
    fn default() -> Self {
        Self {
            spec_prefix: "SPEC".to_string(),
            requirements_headings: vec!["Requirements".to_string()],
            traceability_headings: vec!["Traceability Matrix".to_string()],
            traceability_heading_level: 2,
            required_sections: Vec::new(),
            scan: ScanConfig::default(),
            generate: GenerateConfig::default(),
            catalog: None,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

/// Source-tree scanning settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names marking test code
    pub test_dirs: Vec<String>,
    /// File-stem suffixes marking test code
    pub test_suffixes: Vec<String>,
    /// File-stem prefixes marking test code
    pub test_prefixes: Vec<String>,
    /// File extensions to scan; empty scans every UTF-8 file
    pub extensions: Vec<String>,
    /// Comment openers that may precede a requirement id
    pub comment_markers: Vec<String>,
    /// Count ids inside generated header blocks
    pub count_generated_headers: bool,
}

impl ScanConfig {
    /// With extension filter
    #[inline]
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Count header refs as markers
    #[inline]
    #[must_use]
    pub fn with_generated_headers(mut self, count: bool) -> Self {
        self.count_generated_headers = count;
        self
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| (*s).to_string()).collect()
        }
        Self {
            test_dirs: strings(&["test", "tests", "androidTest", "__tests__"]),
            test_suffixes: strings(&["Test", "Tests", "_test", ".test", "_spec", ".spec"]),
            test_prefixes: strings(&["test_"]),
            extensions: Vec::new(),
            comment_markers: strings(&["//", "#", "--", "/*", "*", ";", "<!--"]),
            count_generated_headers: false,
        }
    }
}

/// Scaffold generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Package / namespace of generated code
    pub namespace: String,
    /// Directory holding a `templates.yaml` manifest
    pub templates_dir: Option<PathBuf>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            namespace: "com.example.app".to_string(),
            templates_dir: None,
        }
    }
}
