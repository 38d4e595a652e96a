//! Region errors
//!
//! A file on disk missing its closing sentinel is not an error; it is
//! reported as [`FileState::HeaderOpen`](crate::FileState::HeaderOpen).
//! These errors cover headers the generator itself tried to build.

/// Errors building a header region
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    /// Header text lacks a sentinel
    #[error("header region is missing the '{0}' sentinel")]
    MissingSentinel(&'static str),

    /// Comment prefix cannot start a line comment
    #[error("invalid comment prefix: '{0}'")]
    InvalidCommentPrefix(String),
}
