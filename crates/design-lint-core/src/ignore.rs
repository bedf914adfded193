//! Persisted suppression directives and their pruning.
//!
//! Directives exist at four scopes: pages (by id), rule-sets (by name),
//! rules (by name, within a rule-set) and objects (by id, within a rule).
//! A rule entry is either fully ignored (`allObjects`) or object-scoped
//! (`objects`); an entry with neither ignores nothing.
//!
//! Directives go stale as documents and rule-sets change. The pruning stages
//! below drop stale directives silently; each returns a new config and
//! running all four on their own output changes nothing.

use crate::index::ProcessedFile;
use crate::rule_set::RuleSetDefinition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Suppression directives for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreConfig {
    /// Ids of pages whose contents are ignored by every rule.
    #[serde(default)]
    pub pages: Vec<String>,
    /// Rule-set scoped directives keyed by rule-set name.
    #[serde(default)]
    pub rule_sets: BTreeMap<String, RuleSetIgnore>,
}

/// Directives scoped to one rule-set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetIgnore {
    /// Rule directives keyed by rule name.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleIgnore>,
}

/// Directive for one rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleIgnore {
    /// The rule does not run at all.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all_objects: bool,
    /// Ids of objects the rule skips.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<String>,
}

impl RuleIgnore {
    /// True when the directive ignores nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.all_objects && self.objects.is_empty()
    }
}

impl IgnoreConfig {
    /// Creates an empty config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignores a page.
    #[must_use]
    pub fn ignore_page(mut self, page_id: impl Into<String>) -> Self {
        self.pages.push(page_id.into());
        self
    }

    /// Ignores a rule entirely.
    #[must_use]
    pub fn ignore_rule(mut self, rule_set: &str, rule: &str) -> Self {
        self.rule_entry(rule_set, rule).all_objects = true;
        self
    }

    /// Ignores objects for one rule.
    #[must_use]
    pub fn ignore_objects<I, S>(mut self, rule_set: &str, rule: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_entry(rule_set, rule)
            .objects
            .extend(ids.into_iter().map(Into::into));
        self
    }

    fn rule_entry(&mut self, rule_set: &str, rule: &str) -> &mut RuleIgnore {
        self.rule_sets
            .entry(rule_set.to_string())
            .or_default()
            .rules
            .entry(rule.to_string())
            .or_default()
    }

    /// The directive of a rule, if any.
    #[must_use]
    pub fn rule(&self, rule_set: &str, rule: &str) -> Option<&RuleIgnore> {
        self.rule_sets.get(rule_set)?.rules.get(rule)
    }

    /// True when the rule must not run.
    #[must_use]
    pub fn is_rule_fully_ignored(&self, rule_set: &str, rule: &str) -> bool {
        self.rule(rule_set, rule).is_some_and(|r| r.all_objects)
    }

    /// Ids of objects one rule skips.
    #[must_use]
    pub fn ignored_objects(&self, rule_set: &str, rule: &str) -> &[String] {
        self.rule(rule_set, rule)
            .map_or(&[][..], |r| r.objects.as_slice())
    }

    /// True when a page is ignored.
    #[must_use]
    pub fn is_page_ignored(&self, page_id: &str) -> bool {
        self.pages.iter().any(|p| p == page_id)
    }
}

/// Stage 1: drops page ids absent from the document.
///
/// A partial index proves nothing absent, so nothing is dropped.
#[must_use]
pub fn prune_pages(config: &IgnoreConfig, file: &ProcessedFile<'_>) -> IgnoreConfig {
    if !file.complete {
        return config.clone();
    }
    let pages: HashSet<&str> = file.pages().iter().filter_map(|p| p.id()).collect();
    IgnoreConfig {
        pages: config
            .pages
            .iter()
            .filter(|id| pages.contains(id.as_str()))
            .cloned()
            .collect(),
        rule_sets: config.rule_sets.clone(),
    }
}

/// Stage 2: drops rule-sets that are not about to run.
#[must_use]
pub fn prune_rule_sets(config: &IgnoreConfig, rule_set_names: &[&str]) -> IgnoreConfig {
    IgnoreConfig {
        pages: config.pages.clone(),
        rule_sets: config
            .rule_sets
            .iter()
            .filter(|(name, _)| rule_set_names.contains(&name.as_str()))
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect(),
    }
}

/// Stage 3: drops rules their rule-set does not define.
///
/// Rule-sets without a definition, such as ones that failed to prepare, are
/// kept as they are.
#[must_use]
pub fn prune_rules(config: &IgnoreConfig, definitions: &[&RuleSetDefinition]) -> IgnoreConfig {
    let mut rule_sets = BTreeMap::new();
    for (name, entry) in &config.rule_sets {
        let Some(definition) = definitions.iter().find(|d| d.name == *name) else {
            rule_sets.insert(name.clone(), entry.clone());
            continue;
        };
        let rules: BTreeMap<String, RuleIgnore> = entry
            .rules
            .iter()
            .filter(|(rule, _)| definition.rule(rule).is_some())
            .map(|(rule, directive)| (rule.clone(), directive.clone()))
            .collect();
        if !rules.is_empty() {
            rule_sets.insert(name.clone(), RuleSetIgnore { rules });
        }
    }
    IgnoreConfig {
        pages: config.pages.clone(),
        rule_sets,
    }
}

/// Stage 4: drops object ids absent from the document.
///
/// Like [`prune_pages`], a no-op on a partial index.
#[must_use]
pub fn prune_objects(config: &IgnoreConfig, file: &ProcessedFile<'_>) -> IgnoreConfig {
    if !file.complete {
        return config.clone();
    }
    let mut rule_sets = BTreeMap::new();
    for (name, entry) in &config.rule_sets {
        let rules: BTreeMap<String, RuleIgnore> = entry
            .rules
            .iter()
            .map(|(rule, directive)| {
                let objects = directive
                    .objects
                    .iter()
                    .filter(|id| file.object_ids.contains(id.as_str()))
                    .cloned()
                    .collect();
                (
                    rule.clone(),
                    RuleIgnore {
                        all_objects: directive.all_objects,
                        objects,
                    },
                )
            })
            .filter(|(_, directive)| !directive.is_empty())
            .collect();
        if !rules.is_empty() {
            rule_sets.insert(name.clone(), RuleSetIgnore { rules });
        }
    }
    IgnoreConfig {
        pages: config.pages.clone(),
        rule_sets,
    }
}

/// Runs all four stages in order.
///
/// `rule_set_names` are the rule-sets about to run; `definitions` the ones
/// among them that resolved.
#[must_use]
pub fn prune(
    config: &IgnoreConfig,
    file: &ProcessedFile<'_>,
    rule_set_names: &[&str],
    definitions: &[&RuleSetDefinition],
) -> IgnoreConfig {
    let pruned = prune_pages(config, file);
    let pruned = prune_rule_sets(&pruned, rule_set_names);
    let pruned = prune_rules(&pruned, definitions);
    let pruned = prune_objects(&pruned, file);
    if pruned != *config {
        debug!("Pruned stale ignore directives");
    }
    pruned
}
