//! Error types for the document layer
//!
//! Content problems are never errors here: they are findings in a
//! [`ValidationReport`](crate::ValidationReport). Only a document without a
//! locatable front-matter block fails to parse.

use std::path::PathBuf;

/// Errors during document parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Front matter absent or unterminated
    #[error("malformed document: {reason}")]
    MalformedDocument {
        /// What is wrong
        reason: String,
    },
}

impl ParseError {
    /// Create a malformed-document error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }
}

/// Errors reading the machine-owned traceability table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// No `|` rows in the section
    #[error("no table found")]
    MissingTable,

    /// Header row does not name the four expected columns
    #[error("unexpected table header: '{0}'")]
    BadHeader(String),

    /// Second row is not a `|---|` separator
    #[error("missing header separator row")]
    MissingSeparator,

    /// A data row could not be read
    #[error("row {row}: {reason}")]
    BadRow {
        /// 1-based data row index
        row: usize,
        /// What is wrong
        reason: String,
    },
}

impl TableError {
    /// Create a bad-row error
    pub fn bad_row(row: usize, reason: impl Into<String>) -> Self {
        Self::BadRow {
            row,
            reason: reason.into(),
        }
    }
}

/// Errors at the file boundary
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// IO error while reading or writing a document
    #[error("io error during {stage} of {path}: {source}")]
    Io {
        /// Document path
        path: PathBuf,
        /// Operation (`read`, `write`)
        stage: &'static str,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document could not be parsed
    #[error("{path}: {source}")]
    Parse {
        /// Document path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ParseError,
    },

    /// Document exceeds the configured size limit
    #[error("{path} is too large: {size} bytes (max: {max})")]
    TooLarge {
        /// Document path
        path: PathBuf,
        /// Actual size
        size: usize,
        /// Configured limit
        max: usize,
    },
}

impl LayerError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, stage: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            stage,
            source,
        }
    }

    /// Create parse error for path
    pub fn parse_error(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}
