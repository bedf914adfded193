//! Rule to forbid layer names matching configured patterns.
//!
//! # Rationale
//!
//! Default names such as "Rectangle 12" or "Group copy" carry no meaning for
//! developers reading the handoff.
//!
//! # Configuration
//!
//! - `patterns`: regular expressions a layer name must not match

use async_trait::async_trait;
use design_lint_core::{CheckError, OptionSchema, Rule, RuleConfig, RuleUtils, SchemaError};
use regex::Regex;

/// Rule name for names-pattern-disallowed.
pub const NAME: &str = "names-pattern-disallowed";

/// Option holding the disallowed patterns.
pub const PATTERNS: &str = "patterns";

/// Forbids layer names matching any configured pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamesPatternDisallowed;

impl NamesPatternDisallowed {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Rule for NamesPatternDisallowed {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self, _config: &RuleConfig) -> String {
        "Layer names should be meaningful".to_string()
    }

    fn options(&self) -> Result<Vec<OptionSchema>, SchemaError> {
        Ok(vec![OptionSchema::string_array(
            PATTERNS,
            "Patterns",
            "Regular expressions layer names must not match",
        )?])
    }

    async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        let patterns = utils
            .option::<Vec<String>>(PATTERNS)?
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|e| anyhow::anyhow!("invalid pattern `{pattern}`: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for layer in utils.objects().layers() {
            let Some(name) = layer.name() else { continue };
            if let Some(pattern) = patterns.iter().find(|p| p.is_match(name)) {
                utils.report(
                    format!("Layer name `{name}` matches disallowed pattern `{pattern}`"),
                    &[layer],
                )?;
            }
        }
        Ok(())
    }
}
