//! Document file boundary
//!
//! The only place in this crate that touches the filesystem. Reads are
//! whole-file and size-limited; writes skip files whose contents would not
//! change.

use crate::document::SpecDocument;
use crate::error::LayerError;
use crate::parser::{DocumentParser, ParseOptions};
use speclink_artifact::ContentHash;
use std::path::{Path, PathBuf};

/// Default size limit (10 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// A document read from disk
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Parsed document
    pub document: SpecDocument,
    /// Source path
    pub path: PathBuf,
    /// Hash of the normalized text that was parsed
    pub checksum: ContentHash,
}

/// Reads and writes requirements documents
#[derive(Debug, Clone)]
pub struct DocumentLayer {
    parser: DocumentParser,
    max_document_bytes: usize,
}

impl Default for DocumentLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLayer {
    /// Create layer with default heading names and size limit
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default(), DEFAULT_MAX_DOCUMENT_BYTES)
    }

    /// Create layer with custom heading names and size limit
    #[inline]
    #[must_use]
    pub fn with_options(options: ParseOptions, max_document_bytes: usize) -> Self {
        Self {
            parser: DocumentParser::with_options(options),
            max_document_bytes,
        }
    }

    /// Parser in use
    #[inline]
    #[must_use]
    pub fn parser(&self) -> &DocumentParser {
        &self.parser
    }

    /// Read and parse a document
    ///
    /// # Errors
    /// - `LayerError::Io` if the file cannot be read
    /// - `LayerError::TooLarge` if it exceeds the size limit
    /// - `LayerError::Parse` if the front matter is missing or unterminated
    pub fn read(&self, path: impl AsRef<Path>) -> Result<LoadedDocument, LayerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LayerError::io_error(path, "read", e))?;

        if content.len() > self.max_document_bytes {
            return Err(LayerError::TooLarge {
                path: path.to_path_buf(),
                size: content.len(),
                max: self.max_document_bytes,
            });
        }

        let document = self
            .parser
            .parse(&content)
            .map_err(|e| LayerError::parse_error(path, e))?;
        let checksum = ContentHash::of_text(&document.serialize());

        tracing::info!(
            path = %path.display(),
            spec = %document.id(),
            requirements = document.requirements().len(),
            "document loaded"
        );

        Ok(LoadedDocument {
            document,
            path: path.to_path_buf(),
            checksum,
        })
    }

    /// Serialize a document to disk
    ///
    /// Returns `false` without writing when the file already holds exactly
    /// this text.
    ///
    /// # Errors
    /// `LayerError::Io` if the file cannot be written.
    pub fn write(&self, document: &SpecDocument, path: impl AsRef<Path>) -> Result<bool, LayerError> {
        let path = path.as_ref();
        let text = document.serialize();

        if let Ok(existing) = std::fs::read_to_string(path) {
            if ContentHash::of_text(&existing) == ContentHash::of_text(&text) {
                tracing::debug!(path = %path.display(), "document unchanged");
                return Ok(false);
            }
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LayerError::io_error(parent, "write", e))?;
        }
        std::fs::write(path, text).map_err(|e| LayerError::io_error(path, "write", e))?;
        tracing::info!(path = %path.display(), spec = %document.id(), "document written");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---\nid: SPEC-001\n---\n## Requirements\nThe system shall a.\n";

    #[test]
    fn read_then_write_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SPEC-001.md");
        std::fs::write(&path, DOC).unwrap();

        let layer = DocumentLayer::new();
        let loaded = layer.read(&path).unwrap();
        assert_eq!(loaded.document.requirements().len(), 1);
        assert_eq!(loaded.checksum, ContentHash::of_text(DOC));
        assert!(!layer.write(&loaded.document, &path).unwrap());
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specs/nested/SPEC-001.md");
        let doc = crate::parse(DOC).unwrap();
        assert!(DocumentLayer::new().write(&doc, &path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOC);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocumentLayer::new().read(dir.path().join("nope.md")).unwrap_err();
        assert!(matches!(err, LayerError::Io { stage: "read", .. }));
    }

    #[test]
    fn size_limit_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.md");
        std::fs::write(&path, DOC).unwrap();
        let layer = DocumentLayer::with_options(ParseOptions::default(), 8);
        assert!(matches!(layer.read(&path), Err(LayerError::TooLarge { .. })));
    }

    #[test]
    fn unparseable_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.md");
        std::fs::write(&path, "# no front matter\n").unwrap();
        assert!(matches!(DocumentLayer::new().read(&path), Err(LayerError::Parse { .. })));
    }
}
