//! Rule presets for common configurations.
//!
//! Every preset produces the [`CORE`] rule-set. [`Preset::Strict`] is the
//! recommended package extended with stricter overrides, so both can be
//! linted against the same ignore directives.

use crate::{
    images_max_dimensions, layers_max_depth, names_pattern_disallowed, pages_max,
    shared_styles_no_duplicates, ImagesMaxDimensions, LayersMaxDepth, NamesPatternDisallowed,
    PagesMax, SharedStylesNoDuplicates,
};
use design_lint_core::{
    RuleBox, RuleConfig, RuleSetConfig, RuleSetDefinition, RuleSetEnv, RuleSetSource, Severity,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Name of the built-in rule-set.
pub const CORE: &str = "core";

/// Layer names generated by the editor for new or duplicated layers.
pub const DEFAULT_NAME_PATTERN: &str =
    r"^(Rectangle|Oval|Group|Path|Line|Text|Image|Combined Shape)( \d+)?( copy( \d+)?)?$";

/// Preset configurations for design-lint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Recommended rules with sensible defaults.
    Recommended,
    /// Recommended rules with tighter limits, every violation an error.
    Strict,
}

impl Preset {
    /// Returns the rule-set package for this preset.
    #[must_use]
    pub fn source(self) -> RuleSetSource {
        let recommended = RuleSetSource::producer(core_rule_set);
        match self {
            Self::Recommended => recommended,
            Self::Strict => recommended.extend(RuleSetSource::producer(strict_overrides)),
        }
    }

    /// Returns the packages map expected by
    /// [`run_multiple`](design_lint_core::run_multiple).
    #[must_use]
    pub fn packages(self) -> BTreeMap<String, RuleSetSource> {
        BTreeMap::from([(CORE.to_string(), self.source())])
    }
}

/// Returns all available rules.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![
        Arc::new(LayersMaxDepth::new()),
        Arc::new(SharedStylesNoDuplicates::new()),
        Arc::new(NamesPatternDisallowed::new()),
        Arc::new(ImagesMaxDimensions::new()),
        Arc::new(PagesMax::new()),
    ]
}

/// Returns the recommended configuration.
///
/// `images-max-dimensions` is configured but inactive, since it needs
/// archive access the host may not have.
#[must_use]
pub fn recommended_config() -> RuleSetConfig {
    RuleSetConfig::new()
        .rule(
            layers_max_depth::NAME,
            RuleConfig::active()
                .with_severity(Severity::Warn)
                .with_option(layers_max_depth::MAX_DEPTH, 6),
        )
        .rule(shared_styles_no_duplicates::NAME, RuleConfig::active())
        .rule(
            names_pattern_disallowed::NAME,
            RuleConfig::active()
                .with_severity(Severity::Warn)
                .with_option(names_pattern_disallowed::PATTERNS, vec![DEFAULT_NAME_PATTERN]),
        )
        .rule(
            images_max_dimensions::NAME,
            RuleConfig::inactive()
                .with_option(images_max_dimensions::MAX_WIDTH, 2048)
                .with_option(images_max_dimensions::MAX_HEIGHT, 2048),
        )
        .rule(
            pages_max::NAME,
            RuleConfig::active()
                .with_severity(Severity::Info)
                .with_option(pages_max::MAX_PAGES, 20),
        )
}

/// Returns the overrides the strict preset layers over the recommended one.
#[must_use]
pub fn strict_config() -> RuleSetConfig {
    RuleSetConfig::new()
        .rule(
            layers_max_depth::NAME,
            RuleConfig::active().with_option(layers_max_depth::MAX_DEPTH, 4),
        )
        .rule(
            names_pattern_disallowed::NAME,
            RuleConfig::active()
                .with_option(names_pattern_disallowed::PATTERNS, vec![DEFAULT_NAME_PATTERN]),
        )
        .rule(
            images_max_dimensions::NAME,
            RuleConfig::active()
                .with_option(images_max_dimensions::MAX_WIDTH, 2048)
                .with_option(images_max_dimensions::MAX_HEIGHT, 2048),
        )
        .rule(
            pages_max::NAME,
            RuleConfig::active().with_option(pages_max::MAX_PAGES, 10),
        )
}

/// Produces the recommended [`CORE`] rule-set.
///
/// # Errors
///
/// Never fails; the signature matches
/// [`RuleSetProducer`](design_lint_core::RuleSetProducer).
pub fn core_rule_set(env: &RuleSetEnv) -> anyhow::Result<RuleSetDefinition> {
    debug!("Producing {CORE} rule-set for {:?}", env.runtime);
    Ok(all_rules()
        .into_iter()
        .fold(RuleSetDefinition::new(CORE), RuleSetDefinition::with_rule)
        .with_config(recommended_config()))
}

/// Produces the strict overrides of the [`CORE`] rule-set.
///
/// # Errors
///
/// Never fails; the signature matches
/// [`RuleSetProducer`](design_lint_core::RuleSetProducer).
pub fn strict_overrides(_env: &RuleSetEnv) -> anyhow::Result<RuleSetDefinition> {
    Ok(RuleSetDefinition::new(CORE).with_config(strict_config()))
}
