//! Core types for violations, rule errors and rule-set results.

use crate::config::RuleSetConfig;
use crate::context::Runtime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity level for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail the run.
    Info,
    /// Warning that should be addressed, does not fail the run.
    Warn,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Location of an object implicated in a violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationLocation {
    /// Canonical pointer from the document root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    /// Stable object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// Object name, when the object carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
}

/// A design convention breach reported by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Human-readable message.
    pub message: String,
    /// Name of the rule-set that owns the rule.
    pub rule_set: String,
    /// Rule name (e.g., "layers-max-depth").
    pub rule: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Implicated objects. Empty for document-wide messages.
    pub locations: Vec<ViolationLocation>,
}

impl Violation {
    /// Creates a new violation without locations.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        rule_set: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            message: message.into(),
            rule_set: rule_set.into(),
            rule: rule.into(),
            severity,
            locations: Vec::new(),
        }
    }

    /// Adds a location to this violation.
    #[must_use]
    pub fn with_location(mut self, location: ViolationLocation) -> Self {
        self.locations.push(location);
        self
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!("{}/{}\n", self.rule_set, self.rule);
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        for location in &self.locations {
            let _ = writeln!(
                output,
                "  = at: {} ({})",
                location.pointer.as_deref().unwrap_or("?"),
                location
                    .object_name
                    .as_deref()
                    .or(location.object_id.as_deref())
                    .unwrap_or("unnamed"),
            );
        }
        output
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: [{}/{}] {}",
            self.severity, self.rule_set, self.rule, self.message
        )?;
        if let Some(pointer) = self.locations.first().and_then(|l| l.pointer.as_deref()) {
            write!(f, " (at: {pointer})")?;
        }
        Ok(())
    }
}

/// A failure captured while a rule executed, distinct from a [`Violation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleError {
    /// Name of the rule-set that owns the rule.
    pub rule_set: String,
    /// Rule name.
    pub rule: String,
    /// Error message, including the source chain.
    pub message: String,
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}] {}", self.rule_set, self.rule, self.message)
    }
}

/// Display metadata for a rule that was active during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMetadata {
    /// Rule name.
    pub name: String,
    /// Resolved title, after any `ruleTitle` override.
    pub title: String,
    /// Resolved description.
    pub description: String,
    /// Whether the rule is a debug-only rule.
    pub debug: bool,
    /// Runtime the rule is restricted to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Runtime>,
}

/// Metadata describing the rules of one rule-set run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetMetadata {
    /// Active rules keyed by name.
    pub rules: BTreeMap<String, RuleMetadata>,
    /// The resolved rule-set configuration.
    pub config: RuleSetConfig,
}

/// Timing information for one rule-set run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Wall-clock duration per executed rule, in milliseconds.
    pub rule_timings: BTreeMap<String, f64>,
    /// Number of objects indexed from the document.
    pub object_count: usize,
    /// Time spent indexing the document, in milliseconds.
    pub index_time_ms: f64,
}

/// Result of running one rule-set against one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetResult {
    /// False when any violation is more severe than [`Severity::Warn`].
    pub passed: bool,
    /// All violations reported.
    pub violations: Vec<Violation>,
    /// Failures captured from individual rules.
    pub rule_errors: Vec<RuleError>,
    /// Metadata about the active rules.
    pub metadata: RuleSetMetadata,
    /// Timing information.
    pub profile: Profile,
}

impl RuleSetResult {
    /// Returns true if any violation meets or exceeds the given severity.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Counts violations by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        self.violations
            .iter()
            .fold((0, 0, 0), |(e, w, i), v| match v.severity {
                Severity::Error => (e + 1, w, i),
                Severity::Warn => (e, w + 1, i),
                Severity::Info => (e, w, i + 1),
            })
    }

    /// Formats violations and rule errors as a multi-line report.
    #[must_use]
    pub fn format_report(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        for violation in &self.violations {
            let _ = writeln!(report, "{}", violation.format());
        }
        for error in &self.rule_errors {
            let _ = writeln!(report, "rule error {error}");
        }

        let (errors, warnings, infos) = self.count_by_severity();
        let _ = writeln!(
            report,
            "Found {} error(s), {} warning(s), {} info(s), {} rule error(s)",
            errors,
            warnings,
            infos,
            self.rule_errors.len()
        );
        report
    }
}

/// Derives the pass/fail summary from violation severities.
#[must_use]
pub fn passed(violations: &[Violation]) -> bool {
    !violations.iter().any(|v| v.severity > Severity::Warn)
}
