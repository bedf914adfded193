//! # design-lint-rules
//!
//! Built-in lint rules for design-lint.
//!
//! This crate provides general-purpose design convention rules and the
//! presets that bundle them into the `core` rule-set.
//!
//! ## Available Rules
//!
//! | Name | Options | Description |
//! |------|---------|-------------|
//! | `layers-max-depth` | `maxDepth` | Limits how many groups enclose a layer |
//! | `shared-styles-no-duplicates` | | Forbids visually identical shared styles |
//! | `names-pattern-disallowed` | `patterns` | Forbids layer names matching patterns |
//! | `images-max-dimensions` | `maxWidth`, `maxHeight` | Limits bitmap pixel dimensions |
//! | `pages-max` | `maxPages` | Limits the number of pages |
//!
//! ## Usage
//!
//! ```ignore
//! use design_lint_core::{run_multiple, CancellationToken, DocumentFile, IgnoreConfig, NoImageMetadata, RuleSetEnv};
//! use design_lint_rules::Preset;
//!
//! let output = run_multiple(
//!     &Preset::Recommended.packages(),
//!     &DocumentFile::new(tree),
//!     &IgnoreConfig::default(),
//!     &RuleSetEnv::default(),
//!     &CancellationToken::new(),
//!     &NoImageMetadata,
//! )
//! .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod images_max_dimensions;
pub mod layers_max_depth;
pub mod names_pattern_disallowed;
pub mod pages_max;
mod presets;
pub mod shared_styles_no_duplicates;

#[cfg(test)]
mod test_support;

pub use images_max_dimensions::ImagesMaxDimensions;
pub use layers_max_depth::LayersMaxDepth;
pub use names_pattern_disallowed::NamesPatternDisallowed;
pub use pages_max::PagesMax;
pub use presets::{
    all_rules, core_rule_set, recommended_config, strict_config, strict_overrides, Preset, CORE,
    DEFAULT_NAME_PATTERN,
};
pub use shared_styles_no_duplicates::SharedStylesNoDuplicates;

/// Re-export core types for convenience.
pub use design_lint_core::{Rule, Severity, Violation};
