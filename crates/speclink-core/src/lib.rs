//! speclink core - requirement-driven scaffolding and traceability
//!
//! Runs the stages that sit on top of a parsed requirements document:
//! capability matching, scaffold generation and traceability sync.
//!
//! # Core Concepts
//!
//! - [`Catalog`] / [`match_capabilities`]: tag-scored capability modules
//! - [`TemplateRegistry`] / [`Generator`]: per-role file scaffolds with a
//!   generator-owned header over a developer-owned body
//! - [`RefSelector`]: pluggable choice of requirement refs per generated file
//! - [`SourceScanner`] / [`Synchronizer`]: back-reference scan and the
//!   machine-owned traceability matrix
//! - [`SpecAuthor`]: new documents from a feature name and raw requirement lines
//! - [`Pipeline`]: the stages wired together, gated on validation
//!
//! ```text
//! SpecDocument ─→ Validator ─┬─→ match_capabilities ─→ Generator ─→ files
//!                            └─→ SourceScanner ─→ Synchronizer ─→ SpecDocument'
//! ```
//!
//! # Example
//!
//! ```rust
//! use speclink_core::{match_capabilities, Catalog, CapabilityModule};
//! use speclink_document::parse;
//!
//! let doc = parse("---\nid: SPEC-007\nfeature: Integrate external API\n---\n## Requirements\nThe system shall retry failed calls.\n")?;
//! let catalog = Catalog::new(vec![
//!     CapabilityModule::new("net", ["api", "network"]),
//!     CapabilityModule::new("charts", ["chart", "graph"]),
//! ]);
//! let matches = match_capabilities(&doc, &catalog);
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].name(), "net");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod author;
pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod generator;
pub mod matcher;
pub mod pipeline;
pub mod refs;
pub mod scan;
pub mod summary;
pub mod sync;
pub mod templates;

pub use author::{next_spec_id, AuthoredSpec, NewSpec, SpecAuthor};
pub use catalog::{CapabilityModule, Catalog};
pub use config::{GenerateConfig, ScanConfig, SpeclinkConfig, CONFIG_FILE_NAME};
pub use entity::derive_entities;
pub use error::{
    AuthorError, CatalogError, ConfigError, GenerateError, SpeclinkError, SyncError, TemplateError,
    EXIT_IO_ERROR, EXIT_PARSE_ERROR, EXIT_REQUIREMENTS_PENDING, EXIT_SUCCESS, EXIT_VALIDATION_FAILED,
};
pub use generator::{GenerateOptions, GenerationReport, Generator, SkipNotice};
pub use matcher::{match_capabilities, match_text, CapabilityMatch};
pub use pipeline::{CreatedSpec, Gated, Pipeline, SyncOutcome};
pub use refs::{RefSelector, TokenOverlapSelector};
pub use scan::{ReferenceHit, ScanResult, SourceScanner, TestClassifier};
pub use summary::{render_architecture, render_status_summary, Layer};
pub use sync::{OrphanReference, SyncNotice, SyncReport, Synchronizer};
pub use templates::{Template, TemplateContext, TemplateRegistry};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the pipeline
    pub use crate::{
        Catalog, GenerateOptions, Gated, NewSpec, Pipeline, RefSelector, SpeclinkConfig, SpeclinkError,
        SyncReport,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
