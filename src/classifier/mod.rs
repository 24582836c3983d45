//! Keyword-based document classification.
//!
//! Maps extracted document text to one category of the configured
//! dictionary. Matching is plain substring containment over normalized text:
//! categories are scanned in priority order and the first keyword found wins.
//! There is no scoring, so a keyword embedded in a longer word ("das" inside
//! "todas") still matches.

mod dictionary;

pub use dictionary::{CategoryEntry, DictionaryError, KeywordDictionary, DEFAULT_FALLBACK_CATEGORY};

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase and strip diacritics.
///
/// Text is lowercased, canonically decomposed (NFD), and every combining mark
/// is dropped, so "Médico", "MEDICO" and "médico" all become "medico".
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Outcome of classifying one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Category name.
    pub category: String,
    /// Keyword that selected the category, as configured. `None` for the fallback.
    pub matched_keyword: Option<String>,
}

impl Classification {
    pub fn is_fallback(&self) -> bool {
        self.matched_keyword.is_none()
    }
}

#[derive(Debug, Clone)]
struct Keyword {
    configured: String,
    normalized: String,
}

#[derive(Debug, Clone)]
struct CompiledCategory {
    name: String,
    keywords: Vec<Keyword>,
}

/// Classifier compiled from a [`KeywordDictionary`].
///
/// Keywords are normalized once at construction. Immutable afterwards and
/// cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    categories: Vec<CompiledCategory>,
    fallback: String,
}

impl KeywordClassifier {
    /// Build a classifier, validating the dictionary first.
    pub fn new(dictionary: &KeywordDictionary) -> Result<Self, DictionaryError> {
        dictionary.validate()?;
        Ok(Self::compile(dictionary))
    }

    fn compile(dictionary: &KeywordDictionary) -> Self {
        let categories = dictionary
            .categories
            .iter()
            .map(|entry| {
                let mut keywords: Vec<Keyword> = Vec::with_capacity(entry.keywords.len());
                for configured in &entry.keywords {
                    let normalized = normalize(configured);
                    // An empty keyword would match every text
                    if normalized.is_empty() {
                        tracing::warn!(
                            "Ignoring blank keyword {:?} in category '{}'",
                            configured,
                            entry.name
                        );
                        continue;
                    }
                    if keywords.iter().any(|k| k.normalized == normalized) {
                        continue;
                    }
                    keywords.push(Keyword {
                        configured: configured.clone(),
                        normalized,
                    });
                }
                CompiledCategory {
                    name: entry.name.clone(),
                    keywords,
                }
            })
            .collect();

        Self {
            categories,
            fallback: dictionary.fallback.clone(),
        }
    }

    /// Classify extracted text. Never fails; unmatched text gets the fallback.
    pub fn classify(&self, text: &str) -> Classification {
        let haystack = normalize(text);

        for category in &self.categories {
            for keyword in &category.keywords {
                if haystack.contains(&keyword.normalized) {
                    tracing::debug!(
                        "Classified as '{}' (keyword '{}')",
                        category.name,
                        keyword.configured
                    );
                    return Classification {
                        category: category.name.clone(),
                        matched_keyword: Some(keyword.configured.clone()),
                    };
                }
            }
        }

        Classification {
            category: self.fallback.clone(),
            matched_keyword: None,
        }
    }

    /// Name of the fallback category.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Category names in priority order (fallback excluded).
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::compile(&KeywordDictionary::default())
    }
}
