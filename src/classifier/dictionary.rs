//! Keyword dictionary configuration.
//!
//! The dictionary is an ordered list of categories, each owning a set of
//! keywords, plus the name of the fallback bucket. Order is priority order.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::normalize;

/// Name of the catch-all category used when no keyword matches.
pub const DEFAULT_FALLBACK_CATEGORY: &str = "Geral";

/// Errors raised while loading or validating a dictionary.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Keyword dictionary has no categories")]
    Empty,

    #[error("Duplicate category name: {0}")]
    DuplicateCategory(String),

    #[error("Fallback category '{0}' is also configured as a regular category")]
    FallbackCollision(String),

    #[error("Failed to read dictionary file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse dictionary: {0}")]
    Parse(String),
}

/// A single category and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryEntry {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered keyword dictionary as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordDictionary {
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK_CATEGORY.to_string()
}

impl Default for KeywordDictionary {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            categories: vec![
                CategoryEntry::new(
                    "Despesas Médicas",
                    &["unimed", "hospital", "clinica", "medico", "dentista", "saude"],
                ),
                CategoryEntry::new(
                    "Educação",
                    &["escola", "faculdade", "universidade", "ensino", "curso"],
                ),
                CategoryEntry::new(
                    "Rendimentos",
                    &["informe", "holerite", "salario", "pro-labore"],
                ),
                CategoryEntry::new(
                    "Bancos",
                    &["extrato", "banco", "nubank", "caixa", "santander", "comprovante"],
                ),
                CategoryEntry::new("Impostos", &["darf", "das", "receita"]),
                CategoryEntry::new("Veículos", &["ipva", "licenciamento", "detran"]),
                CategoryEntry::new("Imóveis", &["iptu", "aluguel", "condominio"]),
            ],
        }
    }
}

impl KeywordDictionary {
    /// Load a standalone dictionary file (TOML, YAML or JSON by extension).
    pub fn load_from_path(path: &Path) -> Result<Self, DictionaryError> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let dictionary: KeywordDictionary = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| DictionaryError::Parse(e.to_string()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| DictionaryError::Parse(e.to_string()))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| DictionaryError::Parse(e.to_string()))?,
        };

        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Check structural invariants: at least one category, unique names,
    /// and a fallback distinct from every regular category.
    pub fn validate(&self) -> Result<(), DictionaryError> {
        if self.categories.is_empty() {
            return Err(DictionaryError::Empty);
        }

        let mut seen = HashSet::new();
        for entry in &self.categories {
            if !seen.insert(entry.name.as_str()) {
                return Err(DictionaryError::DuplicateCategory(entry.name.clone()));
            }
        }

        if seen.contains(self.fallback.as_str()) {
            return Err(DictionaryError::FallbackCollision(self.fallback.clone()));
        }

        Ok(())
    }

    /// Whether this is the built-in dictionary.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Total keyword count across categories, after dropping keywords that
    /// normalize to nothing.
    pub fn keyword_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.keywords.iter())
            .filter(|k| !normalize(k).is_empty())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_dictionary_is_valid() {
        let dict = KeywordDictionary::default();
        assert!(dict.validate().is_ok());
        assert_eq!(dict.categories.len(), 7);
        assert_eq!(dict.categories[0].name, "Despesas Médicas");
        assert_eq!(dict.fallback, "Geral");
    }

    #[test]
    fn test_empty_dictionary_rejected() {
        let dict = KeywordDictionary {
            fallback: "Geral".to_string(),
            categories: vec![],
        };
        assert!(matches!(dict.validate(), Err(DictionaryError::Empty)));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let dict = KeywordDictionary {
            fallback: "Geral".to_string(),
            categories: vec![
                CategoryEntry::new("Bancos", &["banco"]),
                CategoryEntry::new("Bancos", &["extrato"]),
            ],
        };
        assert!(matches!(
            dict.validate(),
            Err(DictionaryError::DuplicateCategory(name)) if name == "Bancos"
        ));
    }

    #[test]
    fn test_fallback_collision_rejected() {
        let dict = KeywordDictionary {
            fallback: "Bancos".to_string(),
            categories: vec![CategoryEntry::new("Bancos", &["banco"])],
        };
        assert!(matches!(
            dict.validate(),
            Err(DictionaryError::FallbackCollision(_))
        ));
    }

    #[test]
    fn test_load_toml_preserves_order() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
fallback = "Outros"

[[categories]]
name = "Saúde"
keywords = ["hospital"]

[[categories]]
name = "Escola"
keywords = ["escola", "curso"]
"#
        )
        .unwrap();

        let dict = KeywordDictionary::load_from_path(file.path()).unwrap();
        assert_eq!(dict.fallback, "Outros");
        let names: Vec<_> = dict.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Saúde", "Escola"]);
    }

    #[test]
    fn test_load_json_defaults_fallback() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"categories": [{{"name": "Bancos", "keywords": ["extrato"]}}]}}"#
        )
        .unwrap();

        let dict = KeywordDictionary::load_from_path(file.path()).unwrap();
        assert_eq!(dict.fallback, DEFAULT_FALLBACK_CATEGORY);
        assert_eq!(dict.keyword_count(), 1);
    }

    #[test]
    fn test_keyword_count_skips_blank_keywords() {
        let dict = KeywordDictionary {
            fallback: "Geral".to_string(),
            categories: vec![CategoryEntry::new("Bancos", &["banco", "", "\u{0301}"])],
        };
        // A lone combining mark folds to nothing.
        assert_eq!(dict.keyword_count(), 1);
    }
}
