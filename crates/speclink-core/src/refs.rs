//! Requirement back-references for generated headers
//!
//! Choosing which requirements a generated file "implements" has no ground
//! truth. It is a heuristic behind the [`RefSelector`] trait so it can be
//! swapped without touching the file-writing code; a human is expected to
//! refine the refs.

use crate::matcher::tokenize;
use indexmap::IndexMap;
use speclink_artifact::{Requirement, RequirementId, Role};

/// Picks the requirements a role's file should reference
pub trait RefSelector {
    /// Requirement ids for `role`, in document order
    fn select(&self, role: Role, requirements: &[Requirement]) -> Vec<RequirementId>;

    /// Selector name (for logging)
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> RefSelector for F
where
    F: Fn(Role, &[Requirement]) -> Vec<RequirementId>,
{
    fn select(&self, role: Role, requirements: &[Requirement]) -> Vec<RequirementId> {
        self(role, requirements)
    }
}

/// Default selector: token overlap with a canonical purpose phrase per role
///
/// Every requirement tied at the highest non-zero overlap is chosen. A
/// purpose token matches a requirement token equal to it or, for tokens of
/// four letters or more, starting with it (`cache` matches `cached`).
#[derive(Debug, Clone)]
pub struct TokenOverlapSelector {
    purposes: IndexMap<Role, Vec<String>>,
}

impl Default for TokenOverlapSelector {
    fn default() -> Self {
        let mut selector = Self {
            purposes: IndexMap::new(),
        };
        for (role, phrase) in [
            (Role::Model, "data entity record field property attribute value identifier detail"),
            (Role::UseCase, "validate process calculate compute submit execute perform rule business check"),
            (Role::RepositoryInterface, "retrieve fetch load query save provide data source access"),
            (
                Role::RepositoryImpl,
                "persist save store cache database network api remote local storage offline sync request server",
            ),
            (Role::ViewModel, "state update loading progress error event action refresh observe"),
            (Role::Screen, "display show screen view button form input navigate message tap click"),
            (Role::Test, "validate verify reject invalid error fail correct ensure"),
        ] {
            selector = selector.with_purpose(role, phrase);
        }
        selector
    }
}

impl TokenOverlapSelector {
    /// Create selector with the builtin purpose phrases
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a role's purpose phrase
    #[must_use]
    pub fn with_purpose(mut self, role: Role, phrase: &str) -> Self {
        self.purposes.insert(role, tokenize(phrase));
        self
    }

    /// Purpose tokens for a role
    #[must_use]
    pub fn purpose(&self, role: Role) -> &[String] {
        self.purposes.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct purpose tokens present in `text`
    #[must_use]
    pub fn overlap(&self, role: Role, text: &str) -> usize {
        let tokens = tokenize(text);
        self.purpose(role)
            .iter()
            .filter(|purpose| tokens.iter().any(|token| token_matches(purpose, token)))
            .count()
    }
}

fn token_matches(purpose: &str, token: &str) -> bool {
    token == purpose || (purpose.len() >= 4 && token.starts_with(purpose))
}

impl RefSelector for TokenOverlapSelector {
    fn select(&self, role: Role, requirements: &[Requirement]) -> Vec<RequirementId> {
        let scores: Vec<usize> = requirements.iter().map(|r| self.overlap(role, &r.text)).collect();
        let best = scores.iter().copied().max().unwrap_or(0);
        if best == 0 {
            return Vec::new();
        }
        requirements
            .iter()
            .zip(scores)
            .filter(|(_, score)| *score == best)
            .map(|(r, _)| r.id.clone())
            .collect()
    }

    fn name(&self) -> &'static str {
        "token_overlap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speclink_artifact::{Confidence, IdSource, RequirementKind};

    fn req(id: &str, text: &str) -> Requirement {
        Requirement {
            id: RequirementId::raw(id),
            kind: RequirementKind::Ubiquitous,
            text: text.to_string(),
            confidence: Confidence::Matched,
            line: 1,
            previous_id: None,
            id_source: IdSource::Declared,
        }
    }

    fn requirements() -> Vec<Requirement> {
        vec![
            req("REQ-SPEC-001-U-01", "The system shall validate an email address."),
            req("REQ-SPEC-001-U-02", "The system shall cache profiles in a local database."),
            req("REQ-SPEC-001-U-03", "The system shall display the profile screen."),
        ]
    }

    #[test]
    fn repository_impl_prefers_persistence_words() {
        let refs = TokenOverlapSelector::new().select(Role::RepositoryImpl, &requirements());
        assert_eq!(refs, vec![RequirementId::raw("REQ-SPEC-001-U-02")]);
    }

    #[test]
    fn ties_all_selected() {
        let selector = TokenOverlapSelector::new().with_purpose(Role::Model, "profile");
        let refs = selector.select(Role::Model, &requirements());
        assert_eq!(
            refs,
            vec![RequirementId::raw("REQ-SPEC-001-U-02"), RequirementId::raw("REQ-SPEC-001-U-03")]
        );
    }

    #[test]
    fn no_overlap_selects_nothing() {
        let selector = TokenOverlapSelector::new().with_purpose(Role::Screen, "telemetry");
        assert!(selector.select(Role::Screen, &requirements()).is_empty());
    }

    #[test]
    fn prefix_matching() {
        let selector = TokenOverlapSelector::new();
        assert_eq!(selector.overlap(Role::RepositoryImpl, "Results are cached."), 1);
        assert_eq!(selector.overlap(Role::RepositoryImpl, "The apiary"), 0);
    }

    #[test]
    fn closures_are_selectors() {
        let first = |_: Role, reqs: &[Requirement]| -> Vec<RequirementId> {
            reqs.iter().take(1).map(|r| r.id.clone()).collect()
        };
        let selector: &dyn RefSelector = &first;
        assert_eq!(selector.select(Role::Test, &requirements()).len(), 1);
        assert_eq!(selector.name(), "custom");
    }
}
