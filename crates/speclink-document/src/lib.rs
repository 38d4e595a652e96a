//! speclink document layer
//!
//! Turns requirements documents into [`SpecDocument`] values and back.
//!
//! # Core Operations
//!
//! - **Classify**: [`classify`] assigns one of the five EARS kinds to a sentence
//! - **Parse**: [`parse`] / [`DocumentParser`] split front matter and sections
//!   and build the requirement list
//! - **Validate**: [`validate`] / [`Validator`] produce a [`ValidationReport`]
//! - **Trace table**: [`render_table`] / [`parse_table`] for the machine-owned
//!   section
//! - **Files**: [`DocumentLayer`] reads and writes documents
//!
//! ```text
//! File → DocumentLayer::read → DocumentParser → SpecDocument → Validator → ValidationReport
//!                                                    ↓
//!                               SpecDocument::serialize → DocumentLayer::write → File
//! ```
//!
//! # Example
//!
//! ```rust
//! use speclink_document::{parse, validate};
//!
//! let raw = "---\nid: SPEC-007\nstatus: draft\n---\n## Requirements\nThe system shall validate an email address.\n";
//! let doc = parse(raw)?;
//! assert_eq!(doc.requirements()[0].id.as_str(), "REQ-SPEC-007-U-01");
//! assert!(validate(&doc).ok);
//! assert_eq!(doc.serialize(), raw);
//! # Ok::<(), speclink_document::ParseError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod frontmatter;
pub mod grammar;
pub mod layer;
pub mod parser;
pub mod table;
pub mod validator;

pub use document::{Section, SectionRole, SpecDocument, CAPABILITY_KEYS};
pub use error::{LayerError, ParseError, TableError};
pub use frontmatter::{FrontMatter, MetaEntry, MetaValue};
pub use grammar::{classify, split_requirement_line, Classification, RequirementLine};
pub use layer::{DocumentLayer, LoadedDocument, DEFAULT_MAX_DOCUMENT_BYTES};
pub use parser::{normalize_heading, normalize_line_endings, parse, DocumentParser, ParseOptions};
pub use table::{
    coverage_line, parse_table, render_section_body, render_table, split_section, CoverageCounts,
    SectionContent, TraceRow,
};
pub use validator::{validate, Finding, FindingCode, Severity, ValidationReport, Validator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
