//! speclink composition
//!
//! Keeps regenerated scaffold files from clobbering developer code.
//!
//! # Core Concepts
//!
//! - [`RegionedFile`]: generator-owned header region + developer-owned body
//! - [`HeaderBlock`]: the header contents (`GENERATED-FROM`, role, entity, refs)
//! - [`MergeStrategy`]: decides create / header rewrite / unchanged / skip
//! - [`HeaderOnlyMerge`]: default; [`ForceOverwrite`]: replaces hand-written files
//!
//! # Example
//!
//! ```rust
//! use speclink_composition::{HeaderOnlyMerge, MergeDecision, MergeStrategy, RegionedFile};
//!
//! let file = RegionedFile::new(
//!     "// GENERATED-FROM: SPEC-001\n// END-GENERATED-HEADER\n",
//!     "class User\n",
//! )?;
//! let existing = file.with_body("class User { /* hand-written */ }\n");
//! assert_eq!(HeaderOnlyMerge.merge(Some(&existing), &file), MergeDecision::Unchanged);
//! # Ok::<(), speclink_composition::RegionError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod merge;
mod region;

pub use error::RegionError;
pub use merge::{strategy_for, ForceOverwrite, HeaderOnlyMerge, MergeDecision, MergeStrategy, SkipReason};
pub use region::{
    header_line_range, header_line_ranges, inspect, FileState, HeaderBlock, RegionedFile, END_HEADER,
    GENERATED_FROM,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
