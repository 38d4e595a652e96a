//! Capability matcher
//!
//! Scores catalog modules against a feature name and requirement texts.
//! Integer scoring, per tag:
//!
//! - 4 when the tag (as a contiguous token phrase) appears in the feature name
//! - 2 when it appears anywhere else in the token stream
//! - 1 when it only appears as a substring of some requirement text
//!
//! Results are sorted by descending score, ties kept in catalog order, and
//! only modules scoring above zero are returned.

use crate::catalog::{CapabilityModule, Catalog};
use serde::Serialize;
use speclink_document::SpecDocument;

/// Points for a tag found in the feature name
pub const FEATURE_TAG_POINTS: u32 = 4;
/// Points for a tag found in the requirement tokens
pub const TOKEN_TAG_POINTS: u32 = 2;
/// Points for a tag found only as a substring
pub const SUBSTRING_TAG_POINTS: u32 = 1;

/// Words dropped by [`tokenize`]
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "as", "at", "be", "been", "by", "can", "do", "does", "each",
    "for", "from", "has", "have", "if", "in", "into", "is", "it", "its", "must", "not", "of", "on",
    "or", "shall", "should", "so", "such", "that", "the", "their", "then", "there", "these",
    "this", "those", "to", "was", "were", "when", "where", "which", "while", "will", "with",
    "within", "without", "would",
];

/// Lowercase word tokens with stopwords removed
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| !STOPWORDS.contains(&word.as_str()))
        .collect()
}

/// Whether `phrase` occurs as a contiguous run in `tokens`
#[must_use]
pub fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && tokens.windows(phrase.len()).any(|window| window == phrase)
}

/// A catalog module with its score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityMatch {
    /// Matched module
    pub module: CapabilityModule,
    /// Integer score (> 0)
    pub score: u32,
    /// Tags that contributed, in module order
    pub matched_tags: Vec<String>,
}

impl CapabilityMatch {
    /// Module name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.module.name
    }
}

/// Match a parsed document's feature name and requirements
#[must_use]
pub fn match_capabilities(doc: &SpecDocument, catalog: &Catalog) -> Vec<CapabilityMatch> {
    let texts: Vec<&str> = doc.requirements().iter().map(|r| r.text.as_str()).collect();
    let matches = match_text(doc.feature().unwrap_or_default(), &texts, catalog);
    tracing::debug!(
        spec = %doc.id(),
        matched = matches.len(),
        top = matches.first().map_or("", CapabilityMatch::name),
        "capabilities matched"
    );
    matches
}

/// Match free text before a document exists
#[must_use]
pub fn match_text(feature: &str, requirement_texts: &[&str], catalog: &Catalog) -> Vec<CapabilityMatch> {
    let feature_tokens = tokenize(feature);
    let requirement_tokens: Vec<Vec<String>> = requirement_texts.iter().map(|t| tokenize(t)).collect();
    let lowered: Vec<String> = requirement_texts.iter().map(|t| t.to_lowercase()).collect();

    let mut matches: Vec<CapabilityMatch> = catalog
        .modules()
        .iter()
        .filter_map(|module| {
            let mut score = 0;
            let mut matched_tags = Vec::new();
            for tag in &module.tags {
                let points = score_tag(tag, &feature_tokens, &requirement_tokens, &lowered);
                if points > 0 {
                    score += points;
                    matched_tags.push(tag.clone());
                }
            }
            (score > 0).then(|| CapabilityMatch {
                module: module.clone(),
                score,
                matched_tags,
            })
        })
        .collect();

    // Stable: ties stay in catalog order
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

fn score_tag(tag: &str, feature: &[String], requirements: &[Vec<String>], lowered: &[String]) -> u32 {
    let phrase = tokenize(tag);
    if phrase.is_empty() {
        return 0;
    }
    if contains_phrase(feature, &phrase) {
        FEATURE_TAG_POINTS
    } else if requirements.iter().any(|tokens| contains_phrase(tokens, &phrase)) {
        TOKEN_TAG_POINTS
    } else if lowered.iter().any(|text| text.contains(tag)) {
        SUBSTRING_TAG_POINTS
    } else {
        0
    }
}
