//! Entity names for scaffolding
//!
//! A deterministic string transform, not language analysis: the feature
//! name is split into phrases, each phrase loses its stopwords, its last
//! word is singularized and the result is PascalCased.

use crate::matcher::STOPWORDS;
use speclink_artifact::SpecId;
use speclink_document::SpecDocument;

/// Entities for a document: the `entities` front-matter list when present,
/// otherwise derived from the feature name
#[must_use]
pub fn derive_entities(doc: &SpecDocument) -> Vec<String> {
    let explicit: Vec<String> = doc
        .entities()
        .iter()
        .map(|name| pascal_case(&words(name)))
        .filter(|name| !name.is_empty())
        .collect();
    if explicit.is_empty() {
        entities_from_feature(doc.feature().unwrap_or_default(), doc.id())
    } else {
        dedupe(explicit)
    }
}

/// Entities from a feature name, falling back to `Spec<digits>`
#[must_use]
pub fn entities_from_feature(feature: &str, spec_id: &SpecId) -> Vec<String> {
    let mut entities = Vec::new();
    for phrase in split_phrases(feature) {
        let mut kept: Vec<String> = phrase
            .into_iter()
            .filter(|w| !STOPWORDS.contains(&w.to_lowercase().as_str()))
            .collect();
        if let Some(last) = kept.last_mut() {
            *last = singularize(last);
        }
        let name = pascal_case(&kept);
        if !name.is_empty() {
            entities.push(name);
        }
    }
    if entities.is_empty() {
        let digits: String = spec_id.as_str().chars().filter(char::is_ascii_digit).collect();
        entities.push(format!("Spec{digits}"));
    }
    dedupe(entities)
}

// Phrases separated by `and`, `&`, `,`, `/`, `+`
fn split_phrases(feature: &str) -> Vec<Vec<String>> {
    let mut phrases = Vec::new();
    for chunk in feature.split(['&', ',', '/', '+']) {
        let mut current = Vec::new();
        for word in words(chunk) {
            if word.eq_ignore_ascii_case("and") {
                phrases.push(std::mem::take(&mut current));
            } else {
                current.push(word);
            }
        }
        phrases.push(current);
    }
    phrases.retain(|p| !p.is_empty());
    phrases
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// English plural to singular, suffix rules only
#[must_use]
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if lower.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    if ["xes", "ches", "shes"].iter().any(|suffix| lower.ends_with(suffix)) {
        return word[..word.len() - 2].to_string();
    }
    if lower.len() > 1 && lower.ends_with('s') && !["ss", "us", "is"].iter().any(|s| lower.ends_with(s)) {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Capitalize each word and join
#[must_use]
pub fn pascal_case(words: &[String]) -> String {
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect()
}

/// `UserProfile` → `user_profile`
#[must_use]
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn from(feature: &str) -> Vec<String> {
        entities_from_feature(feature, &SpecId::new("SPEC-007"))
    }

    #[test]
    fn singular_rules() {
        assert_eq!(singularize("Categories"), "Category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("Boxes"), "Box");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("wishes"), "wish");
        assert_eq!(singularize("Orders"), "Order");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("analysis"), "analysis");
        assert_eq!(singularize("access"), "access");
    }

    #[test]
    fn feature_split_on_conjunctions() {
        assert_eq!(from("Orders and Payments"), vec!["Order", "Payment"]);
        assert_eq!(
            from("users & roles, permissions/groups + teams"),
            vec!["User", "Role", "Permission", "Group", "Team"]
        );
    }

    #[test]
    fn stopwords_dropped_and_words_joined() {
        assert_eq!(from("The User Profiles"), vec!["UserProfile"]);
        assert_eq!(from("login for users"), vec!["LoginUser"]);
    }

    #[test]
    fn duplicates_removed_in_order() {
        assert_eq!(from("Order and orders"), vec!["Order"]);
    }

    #[test]
    fn empty_feature_falls_back_to_spec_digits() {
        assert_eq!(from(""), vec!["Spec007"]);
        assert_eq!(from("the and of"), vec!["Spec007"]);
    }

    #[test]
    fn explicit_entities_win() {
        let doc = speclink_document::parse(
            "---\nid: SPEC-001\nfeature: Shopping Carts\nentities: [cart item, Coupon]\n---\n",
        )
        .unwrap();
        assert_eq!(derive_entities(&doc), vec!["CartItem", "Coupon"]);

        let derived = speclink_document::parse("---\nid: SPEC-001\nfeature: Shopping Carts\n---\n").unwrap();
        assert_eq!(derive_entities(&derived), vec!["ShoppingCart"]);
    }

    #[test]
    fn snake() {
        assert_eq!(snake_case("UserProfile"), "user_profile");
        assert_eq!(snake_case("Spec007"), "spec007");
        assert_eq!(snake_case("OAuthToken"), "oauth_token");
    }
}
