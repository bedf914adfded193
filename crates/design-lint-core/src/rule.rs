//! Rule trait and the errors rules can return.

use crate::config::RuleConfig;
use crate::context::Runtime;
use crate::images::ImageMetadataError;
use crate::options::{OptionSchema, SchemaError};
use crate::rule_utils::RuleUtils;
use async_trait::async_trait;
use std::sync::Arc;

/// A predicate checking one design convention against the indexed document.
///
/// Rules read the document exclusively through [`RuleUtils`], which filters
/// out ignored objects and stops iteration once the run is cancelled, and
/// report violations through [`RuleUtils::report`].
///
/// # Example
///
/// ```ignore
/// use design_lint_core::{CheckError, NodeClass, Rule, RuleConfig, RuleUtils};
///
/// pub struct NoEmptyPages;
///
/// #[async_trait::async_trait]
/// impl Rule for NoEmptyPages {
///     fn name(&self) -> &'static str { "pages-no-empty" }
///     fn title(&self, _config: &RuleConfig) -> String { "Pages should not be empty".into() }
///
///     async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError> {
///         for page in utils.objects().of(NodeClass::Page) {
///             if page.children().next().is_none() {
///                 utils.report("Page is empty", &[page])?;
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule, unique within its rule-set.
    fn name(&self) -> &'static str;

    /// Returns the display title, which may depend on the resolved configuration.
    fn title(&self, config: &RuleConfig) -> String;

    /// Returns a description of what this rule checks.
    fn description(&self, _config: &RuleConfig) -> String {
        String::new()
    }

    /// Declares the options this rule reads. Every declared option is required.
    ///
    /// # Errors
    ///
    /// Returns an error if an option declaration is invalid, such as using a
    /// reserved name.
    fn options(&self) -> Result<Vec<OptionSchema>, SchemaError> {
        Ok(Vec::new())
    }

    /// Whether this is a debug-only rule.
    fn debug(&self) -> bool {
        false
    }

    /// The only runtime this rule supports, if it is restricted to one.
    fn runtime(&self) -> Option<Runtime> {
        None
    }

    /// Checks the document, reporting violations through `utils`.
    async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError>;
}

/// Shared rule trait object.
pub type RuleBox = Arc<dyn Rule>;

/// True when a rule can run under the given runtime.
#[must_use]
pub fn supports_runtime(rule: &dyn Rule, runtime: Runtime) -> bool {
    rule.runtime().map_or(true, |r| r == runtime)
}

/// Errors a rule check can end with.
///
/// All variants except [`CheckError::ReportedIgnoredObject`] are captured by
/// the runner as rule errors. That variant signals a rule bypassing the
/// ignore-aware iteration and aborts the rule-set run.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// A declared option is absent from the configuration.
    #[error("option `{option}` is not configured for rule `{rule}` in rule-set `{rule_set}`")]
    MissingOption {
        /// Rule-set name.
        rule_set: String,
        /// Rule name.
        rule: String,
        /// Requested option.
        option: String,
    },

    /// The rule configuration does not match the rule's option schema.
    #[error("invalid configuration for rule `{rule}` in rule-set `{rule_set}`: {details}")]
    InvalidConfig {
        /// Rule-set name.
        rule_set: String,
        /// Rule name.
        rule: String,
        /// Schema violations with their paths.
        details: String,
    },

    /// An option could not be converted to the requested type.
    #[error("option `{option}` of rule `{rule}` has an unexpected shape: {source}")]
    OptionType {
        /// Rule name.
        rule: String,
        /// Requested option.
        option: String,
        /// Conversion failure.
        source: serde_json::Error,
    },

    /// Utilities were requested for a rule the rule-set does not define.
    #[error("rule `{rule}` is not defined in rule-set `{rule_set}`")]
    UnknownRule {
        /// Rule-set name.
        rule_set: String,
        /// Rule name.
        rule: String,
    },

    /// A violation implicated an object on the rule's ignore list.
    #[error("rule `{rule}` in rule-set `{rule_set}` reported ignored object `{object_id}`")]
    ReportedIgnoredObject {
        /// Rule-set name.
        rule_set: String,
        /// Rule name.
        rule: String,
        /// Id of the ignored object.
        object_id: String,
    },

    /// Image metadata lookup failed.
    #[error(transparent)]
    Image(#[from] ImageMetadataError),

    /// Any other failure raised by the rule.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
