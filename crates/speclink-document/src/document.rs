//! Parsed requirements document
//!
//! A [`SpecDocument`] keeps every byte of its source: the front-matter block,
//! the preamble before the first heading, and each headed section as raw
//! text. Requirements and metadata are derived views. Only the explicit
//! mutation methods change the text.

use crate::frontmatter::FrontMatter;
use crate::grammar::split_requirement_line;
use serde::Serialize;
use speclink_artifact::{IdSource, Requirement, RequirementId, SpecId, SpecStatus};

/// Front-matter keys holding capability tags, in lookup order
pub const CAPABILITY_KEYS: [&str; 3] = ["capabilities", "related_skills", "tags"];

/// Part a section plays in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionRole {
    /// Requirements heading or one of its sub-sections
    Requirements,
    /// Machine-owned traceability section
    Traceability,
    /// Opaque body text
    Body,
}

/// One ATX-headed block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Heading level (1-6)
    pub level: u8,
    /// Heading text without `#` markers
    pub title: String,
    /// Role in the document
    pub role: SectionRole,
    /// Raw heading line including its newline
    #[serde(skip)]
    pub(crate) heading: String,
    /// Raw text up to the next heading
    #[serde(skip)]
    pub(crate) body: String,
}

impl Section {
    /// Raw body text
    #[inline]
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Raw heading line
    #[inline]
    #[must_use]
    pub fn heading(&self) -> &str {
        &self.heading
    }
}

/// Where a requirement line sits, for in-place rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequirementSite {
    pub(crate) section: usize,
    pub(crate) line_in_body: usize,
}

/// One requirements artifact
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    pub(crate) id: SpecId,
    pub(crate) front_matter: FrontMatter,
    pub(crate) preamble: String,
    pub(crate) sections: Vec<Section>,
    pub(crate) requirements: Vec<Requirement>,
    pub(crate) sites: Vec<RequirementSite>,
    pub(crate) requirements_section: Option<usize>,
    pub(crate) traceability_section: Option<usize>,
}

impl SpecDocument {
    /// Document id (empty when the front matter has none)
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SpecId {
        &self.id
    }

    /// Front-matter block
    #[inline]
    #[must_use]
    pub fn front_matter(&self) -> &FrontMatter {
        &self.front_matter
    }

    /// Requirements in document order
    #[inline]
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Requirement by id
    #[must_use]
    pub fn requirement(&self, id: &RequirementId) -> Option<&Requirement> {
        self.requirements.iter().find(|r| &r.id == id)
    }

    /// All sections in document order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Sections that are neither requirements nor traceability
    pub fn body_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.role == SectionRole::Body)
    }

    /// Requirements heading section, if located
    #[must_use]
    pub fn requirements_section(&self) -> Option<&Section> {
        self.requirements_section.and_then(|i| self.sections.get(i))
    }

    /// Traceability section, if located
    #[must_use]
    pub fn traceability_section(&self) -> Option<&Section> {
        self.traceability_section.and_then(|i| self.sections.get(i))
    }

    /// Feature name
    #[must_use]
    pub fn feature(&self) -> Option<&str> {
        self.front_matter.text("feature")
    }

    /// Raw status text
    #[must_use]
    pub fn status_text(&self) -> Option<&str> {
        self.front_matter.text("status")
    }

    /// Recognized status, `None` when missing or unknown
    #[must_use]
    pub fn status(&self) -> Option<SpecStatus> {
        self.status_text().and_then(|s| s.parse().ok())
    }

    /// Capability tags from the first present capability key
    #[must_use]
    pub fn capabilities(&self) -> Vec<String> {
        CAPABILITY_KEYS
            .iter()
            .find_map(|key| self.front_matter.get(key))
            .map(|value| value.items())
            .unwrap_or_default()
    }

    /// Explicit entity names from the `entities` key
    #[must_use]
    pub fn entities(&self) -> Vec<String> {
        self.front_matter
            .get("entities")
            .map(|value| value.items())
            .unwrap_or_default()
    }

    /// Reassemble the document text
    ///
    /// Unmodified documents reproduce their (line-ending normalized) source
    /// exactly.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(
            self.preamble.len()
                + self
                    .sections
                    .iter()
                    .map(|s| s.heading.len() + s.body.len())
                    .sum::<usize>()
                + 256,
        );
        out.push_str("---\n");
        out.push_str(&self.front_matter.render());
        out.push_str("---");
        out.push_str(&self.preamble);
        for section in &self.sections {
            out.push_str(&section.heading);
            out.push_str(&section.body);
        }
        out
    }

    /// Replace or append a front-matter entry
    pub fn set_metadata(&mut self, key: &str, value: &str) {
        self.front_matter.set(key, value);
        if key == "id" || (key == "spec_id" && !self.front_matter.contains("id")) {
            self.id = SpecId::new(value);
        }
    }

    /// Replace or append a list-valued front-matter entry
    pub fn set_metadata_list(&mut self, key: &str, items: &[String]) {
        self.front_matter.set_list(key, items);
    }

    /// Rewrite requirement lines whose id was assigned by the parser
    ///
    /// Bare lines and reclassified lines become `- **<id>**: <text>` so the
    /// ids survive the next parse. Returns the number of lines rewritten.
    pub fn stamp_requirement_ids(&mut self) -> usize {
        let mut stamped = 0;
        for (req, site) in self.requirements.iter_mut().zip(&self.sites) {
            if req.id_source != IdSource::Assigned {
                continue;
            }
            let Some(section) = self.sections.get_mut(site.section) else {
                continue;
            };
            let mut lines: Vec<String> = section.body.split_inclusive('\n').map(str::to_string).collect();
            let Some(line) = lines.get_mut(site.line_in_body) else {
                continue;
            };
            let indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
            let ending = if line.ends_with('\n') { "\n" } else { "" };
            let sentence = split_requirement_line(line).sentence;
            *line = format!("{indent}- **{}**: {sentence}{ending}", req.id);
            section.body = lines.concat();

            req.id_source = IdSource::Declared;
            req.previous_id = None;
            stamped += 1;
        }
        if stamped > 0 {
            tracing::debug!(spec = %self.id, stamped, "stamped requirement ids");
        }
        stamped
    }

    /// Replace the traceability section body, creating the section if absent
    ///
    /// Returns the previous body when the section existed.
    pub fn set_traceability_body(&mut self, body: String, title: &str, level: u8) -> Option<String> {
        if let Some(section) = self.traceability_section.and_then(|i| self.sections.get_mut(i)) {
            return Some(std::mem::replace(&mut section.body, body));
        }

        let no_sections = self.sections.is_empty();
        let tail = self
            .sections
            .last_mut()
            .map_or(&mut self.preamble, |s| &mut s.body);
        if !tail.is_empty() && !tail.ends_with('\n') {
            tail.push('\n');
        }
        if no_sections && tail.is_empty() {
            // Closing delimiter needs its own line ending
            tail.push('\n');
        }

        let level = level.clamp(1, 6);
        self.sections.push(Section {
            level,
            title: title.to_string(),
            role: SectionRole::Traceability,
            heading: format!("{} {title}\n", "#".repeat(usize::from(level))),
            body,
        });
        self.traceability_section = Some(self.sections.len() - 1);
        None
    }

    /// Whether the traceability section is the last section
    #[must_use]
    pub fn traceability_is_last(&self) -> bool {
        self.traceability_section
            .is_some_and(|i| i + 1 == self.sections.len())
    }
}
