//! Ordered front-matter block
//!
//! The block between the two `---` delimiters is kept as a list of lines.
//! Each top-level `key: value` line starts an entry; indented lines (and
//! `- item` lines) directly below it belong to that entry. Everything else
//! (comments, blank lines, stray text) is kept as opaque lines. Values are
//! interpreted with YAML but the raw text is what gets written back, so an
//! unmodified block serializes byte-for-byte.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static KEY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<key>[A-Za-z_][A-Za-z0-9_.-]*)\s*:(?:\s|$)").expect("key pattern is valid")
});

/// Interpreted value of a front-matter entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Nothing after the colon
    Empty,
    /// Scalar rendered as text
    Text(String),
    /// Sequence of scalars
    List(Vec<String>),
    /// Anything else YAML accepted (nested mappings)
    Structured(serde_yaml::Value),
}

impl MetaValue {
    /// Interpret the text following `key:`
    fn interpret(source: &str) -> Self {
        if source.trim().is_empty() {
            return Self::Empty;
        }
        match serde_yaml::from_str::<serde_yaml::Value>(source) {
            Ok(value) => Self::from_yaml(value),
            // Not YAML (e.g. an unquoted colon); keep the first line as text
            Err(_) => Self::Text(source.lines().next().unwrap_or_default().trim().to_string()),
        }
    }

    fn from_yaml(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::Empty,
            serde_yaml::Value::Sequence(items) => {
                let scalars: Option<Vec<String>> = items.iter().map(scalar_text).collect();
                match scalars {
                    Some(list) => Self::List(list),
                    None => Self::Structured(serde_yaml::Value::Sequence(items)),
                }
            }
            other => match scalar_text(&other) {
                Some(text) => Self::Text(text),
                None => Self::Structured(other),
            },
        }
    }

    /// Scalar text, if this is a scalar
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Items of a list value; a scalar yields one item
    #[must_use]
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Text(text) => vec![text.clone()],
            Self::Empty | Self::Structured(_) => Vec::new(),
        }
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One `key: value` entry and the raw lines it was read from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaEntry {
    /// Key
    pub key: String,
    /// Interpreted value
    pub value: MetaValue,
    /// Raw text including continuation lines and trailing newlines
    #[serde(skip)]
    raw: String,
}

impl MetaEntry {
    fn from_raw(key: String, raw: String) -> Self {
        let after_colon = raw
            .find(':')
            .map_or("", |idx| &raw[idx + 1..]);
        let value = MetaValue::interpret(after_colon);
        Self { key, value, raw }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Entry(MetaEntry),
    Other(String),
}

/// Ordered front-matter block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    lines: Vec<Line>,
}

impl FrontMatter {
    /// Parse the text between the delimiters (each line newline-terminated)
    #[must_use]
    pub fn parse(block: &str) -> Self {
        let mut lines: Vec<Line> = Vec::new();
        let mut open: Option<(String, String)> = None;

        for line in block.split_inclusive('\n') {
            let continues = open.is_some()
                && !line.trim().is_empty()
                && (line.starts_with(' ') || line.starts_with('\t') || line.starts_with('-'));
            if continues {
                if let Some((_, raw)) = open.as_mut() {
                    raw.push_str(line);
                }
                continue;
            }

            if let Some((key, raw)) = open.take() {
                lines.push(Line::Entry(MetaEntry::from_raw(key, raw)));
            }

            match KEY_LINE.captures(line) {
                Some(caps) => open = Some((caps["key"].to_string(), line.to_string())),
                None => lines.push(Line::Other(line.to_string())),
            }
        }

        if let Some((key, raw)) = open.take() {
            lines.push(Line::Entry(MetaEntry::from_raw(key, raw)));
        }

        Self { lines }
    }

    /// Raw block text
    #[must_use]
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line {
                Line::Entry(entry) => entry.raw.as_str(),
                Line::Other(raw) => raw.as_str(),
            })
            .collect()
    }

    /// Entries in declaration order
    pub fn entries(&self) -> impl Iterator<Item = &MetaEntry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            Line::Other(_) => None,
        })
    }

    /// Value of the first entry with this key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Non-empty scalar text for this key
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(MetaValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether the key is present
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replace the first entry with this key, or append a new one
    ///
    /// `value` is written verbatim after `key: `.
    pub fn set(&mut self, key: &str, value: &str) {
        self.set_raw(key, format!("{key}: {value}\n"));
    }

    /// Replace or append a list entry written as indented `- item` lines
    pub fn set_list(&mut self, key: &str, items: &[String]) {
        let mut raw = format!("{key}:\n");
        for item in items {
            raw.push_str("  - ");
            raw.push_str(item);
            raw.push('\n');
        }
        self.set_raw(key, raw);
    }

    fn set_raw(&mut self, key: &str, raw: String) {
        let entry = MetaEntry::from_raw(key.to_string(), raw);
        let existing = self.lines.iter_mut().find_map(|line| match line {
            Line::Entry(e) if e.key == key => Some(e),
            _ => None,
        });
        match existing {
            Some(slot) => *slot = entry,
            None => self.lines.push(Line::Entry(entry)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BLOCK: &str = "spec_id: SPEC-001\nfeature: User login\n# reviewed\nrelated_skills:\n  - auth\n  - network\ntags: [a, b]\ntraceability:\n  requirements: []\nversion: 1.0.0\n";

    #[test]
    fn parses_entries_in_order() {
        let fm = FrontMatter::parse(BLOCK);
        let keys: Vec<_> = fm.entries().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["spec_id", "feature", "related_skills", "tags", "traceability", "version"]);
        assert_eq!(fm.text("spec_id"), Some("SPEC-001"));
        assert_eq!(fm.text("version"), Some("1.0.0"));
    }

    #[test]
    fn list_values() {
        let fm = FrontMatter::parse(BLOCK);
        assert_eq!(fm.get("related_skills").unwrap().items(), ["auth", "network"]);
        assert_eq!(fm.get("tags").unwrap().items(), ["a", "b"]);
        assert!(matches!(fm.get("traceability"), Some(MetaValue::Structured(_))));
    }

    #[test]
    fn renders_byte_for_byte() {
        assert_eq!(FrontMatter::parse(BLOCK).render(), BLOCK);
    }

    #[test]
    fn non_yaml_value_falls_back_to_text() {
        let fm = FrontMatter::parse("feature: Login: with OAuth\n");
        assert_eq!(fm.text("feature"), Some("Login: with OAuth"));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut fm = FrontMatter::parse("id: SPEC-001\nstatus: draft\nversion: 1.0.0\n");
        fm.set("status", "approved");
        assert_eq!(fm.render(), "id: SPEC-001\nstatus: approved\nversion: 1.0.0\n");
    }

    #[test]
    fn set_appends_missing_key() {
        let mut fm = FrontMatter::parse("id: SPEC-001\n");
        fm.set("status", "draft");
        fm.set_list("capabilities", &["auth".to_string()]);
        assert_eq!(fm.render(), "id: SPEC-001\nstatus: draft\ncapabilities:\n  - auth\n");
        assert_eq!(fm.get("capabilities").unwrap().items(), ["auth"]);
    }

    #[test]
    fn empty_value() {
        let fm = FrontMatter::parse("author:\n");
        assert_eq!(fm.get("author"), Some(&MetaValue::Empty));
        assert_eq!(fm.text("author"), None);
    }
}
