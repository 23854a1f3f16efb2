// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.
//!
//! Hosts usually embed the toolbar with a JSON blob; [`ElementsConfig::from_json`]
//! parses it, fills in defaults for missing fields, and validates the result.

use core::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tags treated as click targets regardless of styling.
pub const DEFAULT_CLICKABLE_TAGS: [&str; 6] = ["a", "button", "input", "select", "textarea", "label"];

/// Errors produced while loading an [`ElementsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON blob could not be parsed.
    #[error("invalid toolbar config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The trailing recompute delay must be positive.
    #[error("trailing_recompute_ms must be greater than zero")]
    ZeroDelay,

    /// At least one clickable tag is required.
    #[error("clickable_tags must not be empty")]
    NoClickableTags,
}

/// Tunables for the elements engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementsConfig {
    /// Quiet period after the last scroll/resize before the trailing recomputation.
    pub trailing_recompute_ms: u64,
    /// Lowercase tag names that are always click targets.
    pub clickable_tags: Vec<String>,
    /// Longest text (in chars) kept when describing an element.
    pub max_text_len: usize,
}

impl Default for ElementsConfig {
    fn default() -> Self {
        Self {
            trailing_recompute_ms: 100,
            clickable_tags: DEFAULT_CLICKABLE_TAGS.iter().map(|t| (*t).to_owned()).collect(),
            max_text_len: 255,
        }
    }
}

impl ElementsConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        for tag in &mut config.clickable_tags {
            tag.make_ascii_lowercase();
        }
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trailing_recompute_ms == 0 {
            return Err(ConfigError::ZeroDelay);
        }
        if self.clickable_tags.is_empty() {
            return Err(ConfigError::NoClickableTags);
        }
        Ok(())
    }

    /// The trailing recompute delay as a [`Duration`].
    pub fn trailing_delay(&self) -> Duration {
        Duration::from_millis(self.trailing_recompute_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = ElementsConfig::from_json("{}").unwrap();
        assert_eq!(config, ElementsConfig::default());
        assert_eq!(config.trailing_delay(), Duration::from_millis(100));
        assert!(config.clickable_tags.iter().any(|t| t == "button"));
    }

    #[test]
    fn partial_override_and_lowercasing() {
        let config =
            ElementsConfig::from_json(r#"{"trailing_recompute_ms": 250, "clickable_tags": ["A", "Summary"]}"#)
                .unwrap();
        assert_eq!(config.trailing_recompute_ms, 250);
        assert_eq!(config.clickable_tags, vec!["a".to_owned(), "summary".to_owned()]);
        assert_eq!(config.max_text_len, 255);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(matches!(
            ElementsConfig::from_json(r#"{"trailing_recompute_ms": 0}"#),
            Err(ConfigError::ZeroDelay)
        ));
        assert!(matches!(
            ElementsConfig::from_json(r#"{"clickable_tags": []}"#),
            Err(ConfigError::NoClickableTags)
        ));
        assert!(matches!(
            ElementsConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
