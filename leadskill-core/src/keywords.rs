//! Keyword tables: configuration keyword to strategy variant.
//!
//! A table is a list of entries, each naming one variant and the aliases it
//! accepts. Tables are plain configuration: built in code or loaded from a
//! TOML file, then handed to whoever resolves keywords.
//!
//! ```toml
//! [[entries]]
//! variant = "ensemble_mean_to_observation"
//! keywords = ["e2o", "e2r"]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerifyError};

/// One variant and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry<T> {
    pub variant: T,
    pub keywords: Vec<String>,
}

impl<T> KeywordEntry<T> {
    pub fn new(variant: T, keywords: &[&str]) -> Self {
        Self {
            variant,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Keyword → variant lookup with a fixed, listable set of keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
#[serde(try_from = "RawTable<T>")]
pub struct KeywordTable<T> {
    entries: Vec<KeywordEntry<T>>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct RawTable<T> {
    entries: Vec<KeywordEntry<T>>,
}

impl<T> TryFrom<RawTable<T>> for KeywordTable<T> {
    type Error = VerifyError;

    fn try_from(raw: RawTable<T>) -> Result<Self> {
        Self::new(raw.entries)
    }
}

impl<T> KeywordTable<T> {
    /// Build a table. A keyword claimed by two entries is rejected.
    pub fn new(entries: Vec<KeywordEntry<T>>) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            for keyword in &entry.keywords {
                if index.insert(keyword.clone(), i).is_some() {
                    return Err(VerifyError::KeywordTable(format!(
                        "keyword '{keyword}' is declared more than once"
                    )));
                }
            }
        }
        Ok(Self { entries, index })
    }

    /// Build a table from entries known to be unique. A repeated keyword
    /// resolves to its last entry.
    pub(crate) fn builtin(entries: Vec<KeywordEntry<T>>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .flat_map(|(i, e)| e.keywords.iter().map(move |k| (k.clone(), i)))
            .collect();
        Self { entries, index }
    }

    pub fn entries(&self) -> &[KeywordEntry<T>] {
        &self.entries
    }

    /// Every accepted keyword, in declaration order.
    pub fn keywords(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| e.keywords.iter().cloned())
            .collect()
    }
}

impl<T: Copy> KeywordTable<T> {
    pub fn lookup(&self, keyword: &str) -> Option<T> {
        self.index.get(keyword).map(|&i| self.entries[i].variant)
    }
}

impl<T: Serialize + DeserializeOwned> KeywordTable<T> {
    /// Load a table from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VerifyError::KeywordTable(format!("read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a table from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VerifyError::KeywordTable(format!("parse TOML: {e}")))
    }

    /// Serialize the table to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| VerifyError::KeywordTable(format!("serialize TOML: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Shape {
        Round,
        Square,
    }

    fn table() -> KeywordTable<Shape> {
        KeywordTable::new(vec![
            KeywordEntry {
                variant: Shape::Round,
                keywords: vec!["round".into(), "circle".into()],
            },
            KeywordEntry {
                variant: Shape::Square,
                keywords: vec!["square".into()],
            },
        ])
        .unwrap()
    }

    #[test]
    fn aliases_resolve_to_same_variant() {
        let t = table();
        assert_eq!(t.lookup("round"), Some(Shape::Round));
        assert_eq!(t.lookup("circle"), Some(Shape::Round));
        assert_eq!(t.lookup("triangle"), None);
        assert_eq!(t.keywords(), vec!["round", "circle", "square"]);
    }

    #[test]
    fn duplicate_keyword_rejected() {
        let err = KeywordTable::new(vec![
            KeywordEntry {
                variant: Shape::Round,
                keywords: vec!["x".into()],
            },
            KeywordEntry {
                variant: Shape::Square,
                keywords: vec!["x".into()],
            },
        ])
        .unwrap_err();
        assert!(matches!(err, VerifyError::KeywordTable(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let t = table();
        let text = t.to_toml().unwrap();
        let back: KeywordTable<Shape> = KeywordTable::from_toml(&text).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.lookup("circle"), Some(Shape::Round));
    }

    #[test]
    fn parses_handwritten_toml() {
        let text = r#"
            [[entries]]
            variant = "square"
            keywords = ["sq", "box"]
        "#;
        let t: KeywordTable<Shape> = KeywordTable::from_toml(text).unwrap();
        assert_eq!(t.lookup("box"), Some(Shape::Square));
    }

    #[test]
    fn duplicate_keyword_in_toml_rejected() {
        let text = r#"
            [[entries]]
            variant = "square"
            keywords = ["sq"]

            [[entries]]
            variant = "round"
            keywords = ["sq"]
        "#;
        assert!(KeywordTable::<Shape>::from_toml(text).is_err());
    }
}
