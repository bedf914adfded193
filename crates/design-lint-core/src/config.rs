//! Configuration types for rule-sets.

use crate::types::Severity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Option names reserved by the engine. Rules cannot declare options with these names.
pub const RESERVED_OPTION_NAMES: &[&str] = &["active", "severity", "ruleTitle"];

/// Configuration of one rule-set: which rules are active and how they are configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSetConfig {
    /// Per-rule configurations keyed by rule name.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

impl RuleSetConfig {
    /// Creates a new empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the configuration of one rule.
    #[must_use]
    pub fn rule(mut self, name: impl Into<String>, config: RuleConfig) -> Self {
        self.rules.insert(name.into(), config);
        self
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a rule is configured and active.
    #[must_use]
    pub fn is_rule_active(&self, rule_name: &str) -> bool {
        self.rules.get(rule_name).is_some_and(|c| c.active)
    }

    /// Gets the configuration of a rule.
    #[must_use]
    pub fn get(&self, rule_name: &str) -> Option<&RuleConfig> {
        self.rules.get(rule_name)
    }

    /// Merges a later configuration into this one. Entries of `later` replace
    /// entries with the same rule name.
    pub fn merge(&mut self, later: Self) {
        self.rules.extend(later.rules);
    }
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// Whether this rule runs.
    #[serde(default)]
    pub active: bool,

    /// Severity of violations reported by this rule (default: error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Overrides the title displayed for this rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_title: Option<String>,

    /// Rule-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl RuleConfig {
    /// Creates an active rule configuration with no options.
    #[must_use]
    pub fn active() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    /// Creates an inactive rule configuration.
    #[must_use]
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Sets the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Sets the title override.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.rule_title = Some(title.into());
        self
    }

    /// Sets a rule-specific option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Gets a raw option value.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Effective severity for violations of this rule.
    #[must_use]
    pub fn effective_severity(&self) -> Severity {
        self.severity.unwrap_or(Severity::Error)
    }

    /// Returns the options as a JSON object, the shape validated against a rule's option schema.
    #[must_use]
    pub fn options_value(&self) -> Value {
        Value::Object(self.options.clone())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}
