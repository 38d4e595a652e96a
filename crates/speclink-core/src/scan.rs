//! Source-tree scanner
//!
//! Finds requirement back-references in a source tree. A reference counts
//! only inside a single-line comment: the id token must follow a comment
//! marker that opens a comment (see [`comment_start`]). Ids inside
//! generated header blocks are ignored unless configured otherwise, since
//! those refs are the generator's guesses.
//!
//! The walk uses `ignore`: sorted by file name, hidden entries skipped,
//! `.gitignore` honoured (inside or outside a git repository).

use crate::config::ScanConfig;
use crate::error::SyncError;
use ignore::WalkBuilder;
use serde::Serialize;
use speclink_artifact::{RequirementId, SourceLocation};
use speclink_composition::header_line_ranges;
use std::path::{Component, Path, PathBuf};

/// Decides whether a path is test code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestClassifier {
    test_dirs: Vec<String>,
    test_suffixes: Vec<String>,
    test_prefixes: Vec<String>,
}

impl TestClassifier {
    /// Create from scan settings
    #[must_use]
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            test_dirs: config.test_dirs.clone(),
            test_suffixes: config.test_suffixes.clone(),
            test_prefixes: config.test_prefixes.clone(),
        }
    }

    /// Test when a directory component is a test dir, or the file stem has a
    /// test suffix or prefix
    #[must_use]
    pub fn is_test(&self, path: &Path) -> bool {
        let in_test_dir = path
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .any(|c| match c {
                Component::Normal(name) => name
                    .to_str()
                    .is_some_and(|name| self.test_dirs.iter().any(|d| d == name)),
                _ => false,
            });
        if in_test_dir {
            return true;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return false;
        };
        self.test_suffixes.iter().any(|s| stem.ends_with(s.as_str()))
            || self.test_prefixes.iter().any(|p| stem.starts_with(p.as_str()))
    }
}

/// One back-reference found in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceHit {
    /// Referenced id
    pub id: RequirementId,
    /// Where (path relative to the scan root, 1-based line)
    pub location: SourceLocation,
    /// Found in test code
    pub is_test: bool,
}

/// Everything a scan found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// References in walk order
    pub hits: Vec<ReferenceHit>,
    /// Files read
    pub files_scanned: usize,
    /// Files skipped as non-UTF-8
    pub files_skipped: usize,
}

/// Walks a tree for requirement references
#[derive(Debug, Clone)]
pub struct SourceScanner {
    config: ScanConfig,
    classifier: TestClassifier,
    exclude: Vec<PathBuf>,
}

impl SourceScanner {
    /// Create scanner from settings
    #[must_use]
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            config: config.clone(),
            classifier: TestClassifier::new(config),
            exclude: Vec::new(),
        }
    }

    /// Skip a file (typically the requirements document itself)
    #[must_use]
    pub fn excluding(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.exclude
            .push(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()));
        self
    }

    /// Classifier in use
    #[inline]
    #[must_use]
    pub fn classifier(&self) -> &TestClassifier {
        &self.classifier
    }

    /// Walk `root` and collect references
    ///
    /// # Errors
    /// - `SyncError::Walk` when the walker fails (missing root, permissions)
    /// - `SyncError::Io` when a file cannot be read
    pub fn scan(&self, root: impl AsRef<Path>) -> Result<ScanResult, SyncError> {
        let root = root.as_ref();
        let mut result = ScanResult::default();
        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if !self.wants_extension(path) || self.is_excluded(path) {
                continue;
            }
            let bytes = std::fs::read(path).map_err(|e| SyncError::io_error(path, "read", e))?;
            let Ok(text) = String::from_utf8(bytes) else {
                tracing::debug!(path = %path.display(), "skipping non-UTF-8 file");
                result.files_skipped += 1;
                continue;
            };
            result.files_scanned += 1;

            let relative = path.strip_prefix(root).unwrap_or(path);
            let is_test = self.classifier.is_test(relative);
            for (line, id) in self.scan_text(&text) {
                result.hits.push(ReferenceHit {
                    id,
                    location: SourceLocation::new(relative, line),
                    is_test,
                });
            }
        }

        tracing::debug!(
            root = %root.display(),
            files = result.files_scanned,
            hits = result.hits.len(),
            "source tree scanned"
        );
        Ok(result)
    }

    /// References in one file's text as `(1-based line, id)`, one per id per line
    #[must_use]
    pub fn scan_text(&self, text: &str) -> Vec<(usize, RequirementId)> {
        let headers = if self.config.count_generated_headers {
            Vec::new()
        } else {
            header_line_ranges(text)
        };
        let mut found = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if headers.iter().any(|range| range.contains(&index)) {
                continue;
            }
            let Some(comment) = comment_start(line, &self.config.comment_markers) else {
                continue;
            };
            let mut on_line: Vec<RequirementId> = Vec::new();
            for (offset, id) in RequirementId::find_all(line) {
                if offset >= comment && !on_line.contains(&id) {
                    on_line.push(id);
                }
            }
            found.extend(on_line.into_iter().map(|id| (index + 1, id)));
        }
        found
    }

    fn wants_extension(&self, path: &Path) -> bool {
        if self.config.extensions.is_empty() {
            return true;
        }
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.config
            .extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.exclude.contains(&canonical)
    }
}

/// Markers that open a comment only as the first non-blank text
const LINE_START_MARKERS: [&str; 2] = ["*", ";"];

/// Byte offset where a comment opens on `line`
///
/// A marker opens a comment when it is the first non-blank text on the
/// line, or when it follows whitespace outside a string literal. `*` and
/// `;` open one only as the first non-blank text (block-comment
/// continuation, Lisp and assembly comments). `"` and `` ` `` always delimit
/// strings; `'` does when it is closed later on the line, so a lone
/// lifetime or apostrophe does not hide the rest of the line.
#[must_use]
pub fn comment_start(line: &str, markers: &[String]) -> Option<usize> {
    let first = line.len() - line.trim_start().len();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous: Option<char> = None;

    for (offset, ch) in line.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            previous = Some(ch);
            continue;
        }

        let rest = &line[offset..];
        let opens = markers
            .iter()
            .filter(|m| !m.is_empty() && rest.starts_with(m.as_str()))
            .any(|m| {
                offset == first
                    || (!LINE_START_MARKERS.contains(&m.as_str()) && previous.is_some_and(char::is_whitespace))
            });
        if opens {
            return Some(offset);
        }

        match ch {
            '"' | '`' => quote = Some(ch),
            '\'' if rest[1..].contains('\'') => quote = Some(ch),
            _ => {}
        }
        previous = Some(ch);
    }
    None
}
