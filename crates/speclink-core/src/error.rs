//! Error types for speclink core
//!
//! Content problems in a document are never errors here; they travel as
//! [`ValidationReport`](speclink_document::ValidationReport) findings or as
//! notices inside generation and sync reports. These enums cover the
//! environment (disk, walker) and unreadable configuration.

use speclink_artifact::Role;
use speclink_composition::RegionError;
use speclink_document::{LayerError, ParseError};
use std::path::PathBuf;

/// Process exit code: success
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code: validation report not ok
pub const EXIT_VALIDATION_FAILED: i32 = 1;
/// Process exit code: verify found requirements with no code reference
pub const EXIT_REQUIREMENTS_PENDING: i32 = 1;
/// Process exit code: unrecoverable parse error
pub const EXIT_PARSE_ERROR: i32 = 2;
/// Process exit code: I/O error
pub const EXIT_IO_ERROR: i32 = 3;

/// Top-level error for pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum SpeclinkError {
    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Capability catalog could not be loaded
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Template manifest could not be loaded
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Document read, parse or write failed
    #[error(transparent)]
    Document(#[from] LayerError),

    /// Scaffold generation failed
    #[error("generation failed: {0}")]
    Generate(#[from] GenerateError),

    /// Traceability sync failed
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),

    /// Document authoring failed
    #[error("create failed: {0}")]
    Author(#[from] AuthorError),
}

impl SpeclinkError {
    /// Exit code the CLI reports for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        let io = match self {
            Self::Config(e) => matches!(e, ConfigError::Io { .. }),
            Self::Catalog(e) => matches!(e, CatalogError::Io { .. }),
            Self::Template(e) => matches!(e, TemplateError::Io { .. }),
            Self::Document(e) => !matches!(e, LayerError::Parse { .. }),
            Self::Generate(e) => matches!(e, GenerateError::Io { .. }),
            Self::Sync(_) => true,
            Self::Author(e) => matches!(e, AuthorError::Io { .. } | AuthorError::AlreadyExists(_)),
        };
        if io {
            EXIT_IO_ERROR
        } else {
            EXIT_PARSE_ERROR
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config path
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },
}

/// Capability catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog file unreadable
    #[error("cannot read catalog {path}: {source}")]
    Io {
        /// Catalog path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// YAML catalog rejected
    #[error("invalid YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON catalog rejected
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// Extension is neither YAML nor JSON
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Template registry errors
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// No template registered for a role
    #[error("no template for role '{0}'")]
    UnknownRole(Role),

    /// Manifest or body file unreadable
    #[error("cannot read template file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Manifest is not valid YAML
    #[error("invalid template manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    /// Manifest names a role outside the known set
    #[error("template '{template}' has unknown role '{role}'")]
    InvalidRole {
        /// Template name
        template: String,
        /// Role as written
        role: String,
    },

    /// Template path is absolute or climbs out of the output directory
    #[error("template '{template}' has an unsafe path pattern '{path}'")]
    UnsafePath {
        /// Template name
        template: String,
        /// Path pattern as written
        path: String,
    },
}

/// Scaffold generation errors
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Filesystem failure, with the file and stage it happened in
    #[error("{stage} {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// `read`, `create_dir` or `write`
        stage: &'static str,
        /// Underlying error
        source: std::io::Error,
    },

    /// Header block could not be built
    #[error("header region: {0}")]
    Region(#[from] RegionError),

    /// Expanded template path is unsafe
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl GenerateError {
    /// Create I/O error with context
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, stage: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            stage,
            source,
        }
    }
}

/// Traceability sync errors
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Filesystem failure, with the file and stage it happened in
    #[error("{stage} {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// `read` or `write`
        stage: &'static str,
        /// Underlying error
        source: std::io::Error,
    },

    /// Directory walk failed
    #[error("walking source tree: {0}")]
    Walk(#[from] ignore::Error),
}

impl SyncError {
    /// Create I/O error with context
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, stage: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            stage,
            source,
        }
    }
}

/// Document authoring errors
#[derive(Debug, thiserror::Error)]
pub enum AuthorError {
    /// Filesystem failure
    #[error("{stage} {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// `scan`, `read` or `write`
        stage: &'static str,
        /// Underlying error
        source: std::io::Error,
    },

    /// Specs directory walk failed
    #[error("walking specs directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Feature name is blank
    #[error("feature name is empty")]
    EmptyFeature,

    /// No requirement lines supplied
    #[error("at least one requirement is needed")]
    NoRequirements,

    /// Rendered document failed to parse
    #[error("rendered document does not parse: {0}")]
    Parse(#[from] ParseError),

    /// Rendered document has error findings
    #[error("rendered document failed validation: {0}")]
    Invalid(String),

    /// Target file already exists
    #[error("refusing to overwrite {0}")]
    AlreadyExists(PathBuf),
}

impl AuthorError {
    /// Create I/O error with context
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, stage: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            stage,
            source,
        }
    }
}
