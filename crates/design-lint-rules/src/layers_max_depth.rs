//! Rule to limit how deeply layers are nested in groups.
//!
//! # Rationale
//!
//! Deep group hierarchies are hard to navigate in the layer list and are
//! usually leftovers from copying content between artboards.
//!
//! # Detected Patterns
//!
//! - Layers enclosed by more groups than allowed. Pages, artboards and
//!   symbol masters start a fresh hierarchy and are not counted.
//!
//! # Configuration
//!
//! - `maxDepth`: maximum number of enclosing groups (at least 1)

use async_trait::async_trait;
use design_lint_core::{
    CheckError, Node, NodeClass, OptionSchema, Rule, RuleConfig, RuleUtils, SchemaError,
};

/// Rule name for layers-max-depth.
pub const NAME: &str = "layers-max-depth";

/// Option holding the maximum depth.
pub const MAX_DEPTH: &str = "maxDepth";

const HIERARCHY_ROOTS: &[NodeClass] = &[
    NodeClass::Document,
    NodeClass::Page,
    NodeClass::Artboard,
    NodeClass::SymbolMaster,
];

/// Limits the number of groups enclosing a layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayersMaxDepth;

impl LayersMaxDepth {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn is_nesting_group(node: &Node<'_>) -> bool {
    node.is_group() && !HIERARCHY_ROOTS.iter().any(|class| node.is(*class))
}

#[async_trait]
impl Rule for LayersMaxDepth {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self, config: &RuleConfig) -> String {
        match config.option(MAX_DEPTH) {
            Some(max) => format!("Layers should be nested at most {max} groups deep"),
            None => "Layers should not be deeply nested".to_string(),
        }
    }

    fn description(&self, _config: &RuleConfig) -> String {
        "Counts the groups enclosing each layer below its page or artboard".to_string()
    }

    fn options(&self) -> Result<Vec<OptionSchema>, SchemaError> {
        Ok(vec![OptionSchema::integer(
            MAX_DEPTH,
            "Maximum depth",
            "Maximum number of groups enclosing a layer",
        )?
        .with_range(Some(1.0), None)])
    }

    async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        let max_depth: usize = utils.option(MAX_DEPTH)?;

        for layer in utils.objects().layers() {
            let depth = utils
                .get_object_parents(layer)
                .iter()
                .filter(|parent| is_nesting_group(parent))
                .count();
            if depth > max_depth {
                utils.report(
                    format!("Layer is nested {depth} groups deep, more than {max_depth}"),
                    &[layer],
                )?;
            }
        }
        Ok(())
    }
}
