//! Rule to detect shared styles with identical visuals.
//!
//! # Rationale
//!
//! Two shared styles that render the same make it unclear which one a layer
//! should use, and they drift apart as soon as one is edited.
//!
//! # Detected Patterns
//!
//! - Shared styles whose fills, borders, shadows, blur and text attributes
//!   all match. Names and generated ids are not compared.

use async_trait::async_trait;
use design_lint_core::utils::Digest;
use design_lint_core::{CheckError, Node, NodeClass, Rule, RuleConfig, RuleUtils};
use std::collections::BTreeMap;

/// Rule name for shared-styles-no-duplicates.
pub const NAME: &str = "shared-styles-no-duplicates";

/// Reports groups of visually identical shared styles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedStylesNoDuplicates;

impl SharedStylesNoDuplicates {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn is_text_style(style: &Node<'_>) -> bool {
    style
        .get("value")
        .and_then(|value| value.get("textStyle"))
        .is_some()
}

#[async_trait]
impl Rule for SharedStylesNoDuplicates {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self, _config: &RuleConfig) -> String {
        "Shared styles should be unique".to_string()
    }

    fn description(&self, _config: &RuleConfig) -> String {
        "Compares the visual attributes of every shared style in the document".to_string()
    }

    async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        let mut by_visuals: BTreeMap<(bool, Digest), Vec<Node<'_>>> = BTreeMap::new();
        for style in utils.objects().of(NodeClass::SharedStyle) {
            let text = is_text_style(&style);
            let digest = if text {
                utils.text_style_hash(style)
            } else {
                utils.style_hash(style)
            };
            by_visuals.entry((text, digest)).or_default().push(style);
        }

        for duplicates in by_visuals.values().filter(|styles| styles.len() > 1) {
            let names = duplicates
                .iter()
                .map(|style| style.name().unwrap_or("unnamed"))
                .collect::<Vec<_>>()
                .join(", ");
            utils.report(
                format!("Shared styles look identical: {names}"),
                duplicates,
            )?;
        }
        Ok(())
    }
}
