//! Per-rule view over a processed document.
//!
//! A [`RuleUtilsFactory`] is built once per rule-set run and hands out one
//! [`RuleUtils`] per rule. Each view applies that rule's ignore directives to
//! iteration, resolves its configuration, and appends its violations to the
//! run's shared accumulator.

use crate::cancellation::CancellationToken;
use crate::config::RuleConfig;
use crate::context::RuleSetEnv;
use crate::ignore::IgnoreConfig;
use crate::images::{ImageMetadata, ImageMetadataCache};
use crate::index::{Node, NodeClass, ObjectCache, ProcessedFile};
use crate::options::{format_violations, is_rule_config_valid};
use crate::rule::{CheckError, Rule};
use crate::rule_set::RuleSetDefinition;
use crate::types::{Violation, ViolationLocation};
use crate::utils::hashing::{self, Digest};
use crate::utils::pointer;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Field holding a layer's style.
pub const STYLE_KEY: &str = "style";

/// Field holding a shared style's definition.
pub const SHARED_STYLE_VALUE_KEY: &str = "value";

/// Everything a rule-set run shares between its rules.
#[derive(Debug)]
pub struct RuleUtilsFactory<'a> {
    processed: &'a ProcessedFile<'a>,
    definition: &'a RuleSetDefinition,
    env: &'a RuleSetEnv,
    violations: &'a Mutex<Vec<Violation>>,
    cancel: &'a CancellationToken,
    images: &'a ImageMetadataCache<'a>,
    ignore: &'a IgnoreConfig,
    ignored_pages: Vec<&'a str>,
}

impl<'a> RuleUtilsFactory<'a> {
    /// Creates a factory for one rule-set run.
    #[must_use]
    pub fn new(
        processed: &'a ProcessedFile<'a>,
        definition: &'a RuleSetDefinition,
        env: &'a RuleSetEnv,
        violations: &'a Mutex<Vec<Violation>>,
        cancel: &'a CancellationToken,
        images: &'a ImageMetadataCache<'a>,
        ignore: &'a IgnoreConfig,
    ) -> Self {
        let ignored_pages = processed
            .pages()
            .iter()
            .filter(|page| page.id().is_some_and(|id| ignore.is_page_ignored(id)))
            .filter_map(|page| processed.pointers.get(*page))
            .collect();

        Self {
            processed,
            definition,
            env,
            violations,
            cancel,
            images,
            ignore,
            ignored_pages,
        }
    }

    /// Creates the view for one rule of the rule-set.
    ///
    /// The rule's configuration is validated here, once; a failure surfaces
    /// on the first [`RuleUtils::get_option`] call.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::UnknownRule`] if the rule-set does not define `name`.
    pub fn for_rule(&self, name: &str) -> Result<RuleUtils<'a>, CheckError> {
        let rule = self
            .definition
            .rule(name)
            .ok_or_else(|| CheckError::UnknownRule {
                rule_set: self.definition.name.clone(),
                rule: name.to_string(),
            })?;
        let config = self.definition.config.get(name).cloned().unwrap_or_default();
        let config_issue = is_rule_config_valid(&config, rule.as_ref())
            .err()
            .map(|violations| format_violations(&violations));
        let ignored_ids = self
            .ignore
            .ignored_objects(&self.definition.name, name)
            .iter()
            .map(String::as_str)
            .collect();

        Ok(RuleUtils {
            processed: self.processed,
            rule_set: &self.definition.name,
            rule: rule.as_ref(),
            env: self.env,
            config,
            config_issue,
            violations: self.violations,
            cancel: self.cancel,
            images: self.images,
            ignored_ids,
            ignored_pages: self.ignored_pages.clone(),
            ignored_report: Mutex::new(None),
        })
    }
}

/// The document as seen by one rule.
pub struct RuleUtils<'a> {
    processed: &'a ProcessedFile<'a>,
    rule_set: &'a str,
    rule: &'a dyn Rule,
    env: &'a RuleSetEnv,
    config: RuleConfig,
    config_issue: Option<String>,
    violations: &'a Mutex<Vec<Violation>>,
    cancel: &'a CancellationToken,
    images: &'a ImageMetadataCache<'a>,
    ignored_ids: HashSet<&'a str>,
    ignored_pages: Vec<&'a str>,
    ignored_report: Mutex<Option<String>>,
}

impl<'a> RuleUtils<'a> {
    /// Name of the rule this view belongs to.
    #[must_use]
    pub fn rule_name(&self) -> &'static str {
        self.rule.name()
    }

    /// Name of the rule-set being run.
    #[must_use]
    pub fn rule_set_name(&self) -> &'a str {
        self.rule_set
    }

    /// The run environment.
    #[must_use]
    pub fn env(&self) -> &'a RuleSetEnv {
        self.env
    }

    /// The rule's resolved configuration.
    #[must_use]
    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// The processed document.
    #[must_use]
    pub fn processed(&self) -> &'a ProcessedFile<'a> {
        self.processed
    }

    /// Natively authored objects, minus ignored ones.
    #[must_use]
    pub fn objects(&self) -> Objects<'_, 'a> {
        Objects {
            cache: &self.processed.objects,
            utils: self,
        }
    }

    /// Library-sourced objects, minus ignored ones.
    #[must_use]
    pub fn foreign_objects(&self) -> Objects<'_, 'a> {
        Objects {
            cache: &self.processed.foreign_objects,
            utils: self,
        }
    }

    /// True when this rule must skip the node.
    #[must_use]
    pub fn is_ignored(&self, node: Node<'_>) -> bool {
        if node.id().is_some_and(|id| self.ignored_ids.contains(id)) {
            return true;
        }
        if self.ignored_pages.is_empty() {
            return false;
        }
        self.get_object_pointer(node).is_some_and(|at| {
            self.ignored_pages.iter().any(|page| {
                at.strip_prefix(page)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
        })
    }

    /// Returns a raw option value.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::InvalidConfig`] if the rule's configuration does
    /// not match its declared options, and [`CheckError::MissingOption`] if
    /// the option is absent.
    pub fn get_option(&self, key: &str) -> Result<&Value, CheckError> {
        if let Some(details) = &self.config_issue {
            return Err(CheckError::InvalidConfig {
                rule_set: self.rule_set.to_string(),
                rule: self.rule_name().to_string(),
                details: details.clone(),
            });
        }
        self.config
            .option(key)
            .ok_or_else(|| CheckError::MissingOption {
                rule_set: self.rule_set.to_string(),
                rule: self.rule_name().to_string(),
                option: key.to_string(),
            })
    }

    /// Returns an option converted to `T`.
    ///
    /// # Errors
    ///
    /// Everything [`Self::get_option`] returns, plus
    /// [`CheckError::OptionType`] if the value does not deserialize into `T`.
    pub fn option<T: DeserializeOwned>(&self, key: &str) -> Result<T, CheckError> {
        let value = self.get_option(key)?;
        serde_json::from_value(value.clone()).map_err(|source| CheckError::OptionType {
            rule: self.rule_name().to_string(),
            option: key.to_string(),
            source,
        })
    }

    /// Pointer of an indexed node.
    #[must_use]
    pub fn get_object_pointer(&self, node: Node<'_>) -> Option<&'a str> {
        self.processed.pointers.get(node)
    }

    /// The nearest enclosing class object of a node.
    #[must_use]
    pub fn get_object_parent(&self, node: Node<'_>) -> Option<Node<'a>> {
        self.ancestors(node).next()
    }

    /// All enclosing class objects of a node, root first.
    #[must_use]
    pub fn get_object_parents(&self, node: Node<'_>) -> Vec<Node<'a>> {
        let mut parents: Vec<Node<'a>> = self.ancestors(node).collect();
        parents.reverse();
        parents
    }

    fn ancestors(&self, node: Node<'_>) -> impl Iterator<Item = Node<'a>> + '_ {
        let root = self.processed.root();
        let start = self.get_object_pointer(node);
        std::iter::successors(start.and_then(pointer::parent_of), |&at| {
            pointer::parent_of(at)
        })
        .filter_map(move |at| pointer::resolve(at, root).and_then(Node::from_value))
    }

    /// Resolves a pointer against the document root.
    #[must_use]
    pub fn eval_pointer(&self, at: &str) -> Option<&'a Value> {
        pointer::resolve(at, self.processed.root())
    }

    /// Reports one violation implicating `nodes`, which may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::ReportedIgnoredObject`] if any node is on this
    /// rule's ignore list. Rules iterating through [`Self::objects`] never
    /// see such nodes. The offence is also recorded for the runner, so
    /// discarding or wrapping the error does not hide it.
    pub fn report(&self, message: impl Into<String>, nodes: &[Node<'_>]) -> Result<(), CheckError> {
        if let Some(id) = nodes
            .iter()
            .filter_map(Node::id)
            .find(|id| self.ignored_ids.contains(id))
        {
            self.ignored_report
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get_or_insert_with(|| id.to_string());
            return Err(CheckError::ReportedIgnoredObject {
                rule_set: self.rule_set.to_string(),
                rule: self.rule_name().to_string(),
                object_id: id.to_string(),
            });
        }

        let violation = nodes.iter().fold(
            Violation::new(
                message,
                self.rule_set,
                self.rule_name(),
                self.config.effective_severity(),
            ),
            |violation, node| {
                violation.with_location(ViolationLocation {
                    pointer: self.get_object_pointer(*node).map(str::to_string),
                    object_id: node.id().map(str::to_string),
                    object_name: node.name().map(str::to_string),
                })
            },
        );
        self.violations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(violation);
        Ok(())
    }

    /// Structural hash of a node, ignoring generated ids.
    #[must_use]
    pub fn object_hash(&self, node: Node<'_>, excluded: &[&str]) -> Digest {
        hashing::stable_hash(node.value(), excluded)
    }

    /// True when two nodes are structurally equal, ignoring generated ids.
    #[must_use]
    pub fn objects_equal(&self, a: Node<'_>, b: Node<'_>, excluded: &[&str]) -> bool {
        self.object_hash(a, excluded) == self.object_hash(b, excluded)
    }

    /// Fingerprint of a node's visual style.
    #[must_use]
    pub fn style_hash(&self, node: Node<'_>) -> Digest {
        hashing::style_hash(style_of(node))
    }

    /// True when two nodes share a visual style.
    #[must_use]
    pub fn style_eq(&self, a: Node<'_>, b: Node<'_>) -> bool {
        self.style_hash(a) == self.style_hash(b)
    }

    /// Fingerprint of a node's text style.
    #[must_use]
    pub fn text_style_hash(&self, node: Node<'_>) -> Digest {
        hashing::text_style_hash(style_of(node))
    }

    /// True when two nodes share a text style.
    #[must_use]
    pub fn text_style_eq(&self, a: Node<'_>, b: Node<'_>) -> bool {
        self.text_style_hash(a) == self.text_style_hash(b)
    }

    /// Id of the first ignored object this rule reported, if any.
    pub(crate) fn ignored_report(&self) -> Option<String> {
        self.ignored_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reads the dimensions of an image packed in the document.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Image`] when the lookup fails.
    pub async fn get_image_metadata(&self, image_ref: &str) -> Result<ImageMetadata, CheckError> {
        let metadata = self
            .images
            .get(image_ref, self.processed.file.filepath.as_deref())
            .await?;
        Ok(metadata)
    }
}

impl std::fmt::Debug for RuleUtils<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleUtils")
            .field("rule_set", &self.rule_set)
            .field("rule", &self.rule_name())
            .field("config", &self.config)
            .field("ignored_ids", &self.ignored_ids.len())
            .finish_non_exhaustive()
    }
}

/// Style nodes carry their fields directly, shared styles under `value` and
/// layers under `style`.
fn style_of(node: Node<'_>) -> Option<&Value> {
    match node.class() {
        Some(NodeClass::Style) => Some(node.value()),
        Some(NodeClass::SharedStyle) => node.get(SHARED_STYLE_VALUE_KEY),
        _ => node.get(STYLE_KEY),
    }
}

/// One cache filtered through a rule's ignore directives.
#[derive(Clone, Copy)]
pub struct Objects<'u, 'a> {
    cache: &'a ObjectCache<'a>,
    utils: &'u RuleUtils<'a>,
}

impl<'u, 'a> Objects<'u, 'a> {
    /// Nodes of one class.
    #[must_use]
    pub fn of(&self, class: NodeClass) -> ObjectIter<'u, 'a> {
        self.iter(self.cache.of(class))
    }

    /// Nodes with a raw discriminator tag.
    #[must_use]
    pub fn of_tag(&self, tag: &str) -> ObjectIter<'u, 'a> {
        self.iter(self.cache.of_tag(tag))
    }

    /// Every layer.
    #[must_use]
    pub fn layers(&self) -> ObjectIter<'u, 'a> {
        self.iter(self.cache.layers())
    }

    /// Every group.
    #[must_use]
    pub fn groups(&self) -> ObjectIter<'u, 'a> {
        self.iter(self.cache.groups())
    }

    fn iter(&self, nodes: &'a [Node<'a>]) -> ObjectIter<'u, 'a> {
        ObjectIter {
            nodes: nodes.iter(),
            utils: self.utils,
        }
    }
}

/// Iterator that skips ignored nodes and ends once the run is cancelled.
pub struct ObjectIter<'u, 'a> {
    nodes: std::slice::Iter<'a, Node<'a>>,
    utils: &'u RuleUtils<'a>,
}

impl<'a> Iterator for ObjectIter<'_, 'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.utils.cancel.is_cancelled() {
                return None;
            }
            let node = *self.nodes.next()?;
            if !self.utils.is_ignored(node) {
                return Some(node);
            }
        }
    }
}
