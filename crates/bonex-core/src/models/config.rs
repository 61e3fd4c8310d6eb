//! Configuration structures for the receipt parsing pipeline.
//!
//! Deny-list keywords, the diacritic folding table, and the section
//! sentinel tokens are immutable configuration handed to the engine, not
//! constants scattered through it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Main configuration for the bonex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BonexConfig {
    /// Receipt parsing configuration.
    pub parser: ParserConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,
}

/// Configuration of the receipt line-interpretation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Line prefix that opens the item-collecting region.
    pub currency_sentinel: String,

    /// Keyword on the trailer line that closes the item-collecting region.
    pub trailer_keyword: String,

    /// Substrings marking lines inside the item region that are skipped
    /// before any item parsing.
    pub line_deny_list: Vec<String>,

    /// Substrings (lower-case) that mark parsed items as non-purchases
    /// (deposits, coupons, rebates, stray total captures).
    pub item_deny_list: Vec<String>,

    /// Accented-letter replacements applied during name normalization,
    /// keyed by the lower-cased letter.
    pub diacritic_folds: Vec<(String, String)>,

    /// Maximum accepted gap between the declared and the computed total.
    pub total_tolerance: Decimal,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            currency_sentinel: "EUR".to_string(),
            trailer_keyword: "SUMME".to_string(),
            line_deny_list: vec![
                "Posten".to_string(),
                "Coupon".to_string(),
                "Positionsrabatt".to_string(),
            ],
            item_deny_list: vec![
                "coupon".to_string(),
                "nummer:".to_string(),
                "summe".to_string(),
                "pfand".to_string(),
                "leergut".to_string(),
                "positionsrabatt".to_string(),
                "jahresstartrab".to_string(),
            ],
            diacritic_folds: vec![
                ("\u{00e4}".to_string(), "ae".to_string()),
                ("\u{00f6}".to_string(), "oe".to_string()),
                ("\u{00fc}".to_string(), "ue".to_string()),
                ("\u{00df}".to_string(), "ss".to_string()),
            ],
            total_tolerance: Decimal::new(1, 2),
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum extracted text length to consider the document readable.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 10,
        }
    }
}

impl BonexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BonexConfig::default();
        assert_eq!(config.parser.currency_sentinel, "EUR");
        assert_eq!(config.parser.trailer_keyword, "SUMME");
        assert!(config.parser.item_deny_list.contains(&"pfand".to_string()));
        assert_eq!(config.parser.total_tolerance, Decimal::new(1, 2));
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BonexConfig::default();
        config.parser.trailer_keyword = "TOTAL".to_string();
        config.save(&path).unwrap();

        let loaded = BonexConfig::from_file(&path).unwrap();
        assert_eq!(loaded.parser.trailer_keyword, "TOTAL");
        assert_eq!(loaded.parser.diacritic_folds, config.parser.diacritic_folds);
    }

    #[test]
    fn test_missing_config_file() {
        let result = BonexConfig::from_file(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(ConfigError::File(_))));
    }
}
