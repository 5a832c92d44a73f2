//! Domain dictionary: keyword and product-code lists used to score
//! sentences.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Externally supplied keyword lists. Missing keys load as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDict {
    /// Domain keywords, worth 2 points each when found in a sentence.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Product or part codes, worth 3 points each when found.
    #[serde(default)]
    pub product_codes: Vec<String>,
}

impl DomainDict {
    /// Create a dictionary from explicit lists.
    pub fn new(keywords: Vec<String>, product_codes: Vec<String>) -> Self {
        Self {
            keywords,
            product_codes,
        }
    }

    /// Parse a dictionary from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a dictionary from a UTF-8 JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let dict = Self::from_json(&content)?;
        log::debug!(
            "Loaded domain dictionary from {}: {} keywords, {} product codes",
            path.as_ref().display(),
            dict.keywords.len(),
            dict.product_codes.len()
        );
        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_full() {
        let dict = DomainDict::from_json(r#"{"keywords": ["良率"], "product_codes": ["PN-100"]}"#)
            .unwrap();
        assert_eq!(dict.keywords, vec!["良率"]);
        assert_eq!(dict.product_codes, vec!["PN-100"]);
    }

    #[test]
    fn test_missing_keys_are_empty() {
        let dict = DomainDict::from_json(r#"{"keywords": ["fail"]}"#).unwrap();
        assert_eq!(dict.keywords, vec!["fail"]);
        assert!(dict.product_codes.is_empty());

        let dict = DomainDict::from_json("{}").unwrap();
        assert_eq!(dict, DomainDict::default());
    }

    #[test]
    fn test_extra_keys_ignored() {
        let dict = DomainDict::from_json(r#"{"product_codes": ["X1"], "owners": ["QA"]}"#).unwrap();
        assert_eq!(dict.product_codes, vec!["X1"]);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = DomainDict::from_json("not json").unwrap_err();
        assert!(matches!(err, crate::Error::JsonError(_)));
    }
}
