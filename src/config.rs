use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "agrolab";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "agrolab=info"
}

// ═══════════════════════════════════════════════════════════
// Parser configuration
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid parser configuration: {0}")]
    Invalid(String),

    #[error("Malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Extraction pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Tunable limits for the extraction strategies.
///
/// Defaults reproduce the behavior lab reports were tuned against; a
/// deployment can override individual fields from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Data rows considered after a table header line.
    pub max_table_rows: usize,
    /// A table row must be longer than this many characters.
    pub min_row_chars: usize,
    /// Trimmed input shorter than this is rejected before any strategy runs.
    pub min_input_chars: usize,
    /// Header candidates whose tokens are mostly numbers are skipped.
    pub max_header_numeric_ratio: f32,
    /// Resolved columns that qualify a line as header without a keyword.
    pub min_resolved_header_columns: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_table_rows: 20,
            min_row_chars: 5,
            min_input_chars: 3,
            max_header_numeric_ratio: 0.34,
            min_resolved_header_columns: 3,
        }
    }
}

impl ParserConfig {
    /// Parse a (possibly partial) JSON override and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_table_rows == 0 {
            return Err(ConfigError::Invalid("max_table_rows must be at least 1".into()));
        }
        if self.min_resolved_header_columns == 0 {
            return Err(ConfigError::Invalid(
                "min_resolved_header_columns must be at least 1".into(),
            ));
        }
        if !(self.max_header_numeric_ratio > 0.0 && self.max_header_numeric_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "max_header_numeric_ratio must be in (0, 1], got {}",
                self.max_header_numeric_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_agrolab() {
        assert_eq!(APP_NAME, "agrolab");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_are_valid() {
        let config = ParserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_table_rows, 20);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = ParserConfig::from_json(r#"{"max_table_rows": 50}"#).unwrap();
        assert_eq!(config.max_table_rows, 50);
        assert_eq!(config.min_row_chars, ParserConfig::default().min_row_chars);
    }

    #[test]
    fn rejects_zero_row_cap() {
        let err = ParserConfig::from_json(r#"{"max_table_rows": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        let err = ParserConfig::from_json(r#"{"max_header_numeric_ratio": 1.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = ParserConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn round_trips_through_json() {
        let config = ParserConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ParserConfig::from_json(&json).unwrap(), config);
    }
}
