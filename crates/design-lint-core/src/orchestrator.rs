//! Runs several rule-set packages against one document.

use crate::cancellation::CancellationToken;
use crate::context::{DocumentFile, RuleSetEnv};
use crate::ignore::{prune, IgnoreConfig};
use crate::images::{ImageMetadataCache, ImageMetadataProvider};
use crate::index::ProcessedFile;
use crate::rule_set::{prepare_named, RuleSetDefinition, RuleSetSource};
use crate::runner::{run_rule_set, EngineError, RunContext};
use crate::types::RuleSetResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Distinguishes ordinary failures from cancellation in a [`RunRejection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionCode {
    /// The run failed.
    Error,
    /// The run was cancelled before it started.
    Cancelled,
}

/// A run that produced no result at all.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum RunRejection {
    /// The package map was empty.
    #[error("no rule-sets to run")]
    #[diagnostic(code(design_lint::run::no_rule_sets))]
    NoRuleSets,

    /// Cancellation was requested before work started.
    #[error("run cancelled before it started")]
    #[diagnostic(code(design_lint::run::cancelled))]
    Cancelled,

    /// A rule-set run aborted.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

impl RunRejection {
    /// The rejection code.
    #[must_use]
    pub fn code(&self) -> RejectionCode {
        match self {
            Self::Cancelled => RejectionCode::Cancelled,
            Self::NoRuleSets | Self::Engine(_) => RejectionCode::Error,
        }
    }
}

/// Outcome of one rule-set entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleSetOutcome {
    /// The package could not be prepared.
    Error {
        /// Failure message.
        message: String,
    },
    /// The rule-set ran.
    Success(RuleSetResult),
}

impl RuleSetOutcome {
    /// The run result, if the rule-set ran.
    #[must_use]
    pub fn result(&self) -> Option<&RuleSetResult> {
        match self {
            Self::Success(result) => Some(result),
            Self::Error { .. } => None,
        }
    }
}

/// Result of [`run_multiple`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiRunOutput {
    /// Outcomes keyed by rule-set name. Rule-sets skipped by cancellation
    /// have no entry.
    pub results: BTreeMap<String, RuleSetOutcome>,
    /// The ignore config with stale directives removed, for the host to persist.
    pub ignore: IgnoreConfig,
}

impl MultiRunOutput {
    /// True when every entry ran and passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.results
            .values()
            .all(|outcome| outcome.result().is_some_and(|r| r.passed))
    }
}

/// Runs every package against `file`.
///
/// The document is indexed once. Each package is prepared and checked
/// against the name it is registered under; a failing package becomes an
/// [`RuleSetOutcome::Error`] entry and the others still run. Rule-sets then
/// run one after another until all finish or cancellation is observed.
///
/// # Errors
///
/// Rejects with [`RunRejection::NoRuleSets`] for an empty map,
/// [`RunRejection::Cancelled`] if `cancel` is already set, and
/// [`RunRejection::Engine`] when a rule reports an ignored object.
pub async fn run_multiple(
    packages: &BTreeMap<String, RuleSetSource>,
    file: &DocumentFile,
    ignore: &IgnoreConfig,
    env: &RuleSetEnv,
    cancel: &CancellationToken,
    images: &dyn ImageMetadataProvider,
) -> Result<MultiRunOutput, RunRejection> {
    if packages.is_empty() {
        return Err(RunRejection::NoRuleSets);
    }
    if cancel.is_cancelled() {
        return Err(RunRejection::Cancelled);
    }

    info!("Running {} rule-sets", packages.len());
    let processed = ProcessedFile::new(file, cancel);
    let images = ImageMetadataCache::new(images);

    let mut results = BTreeMap::new();
    let mut prepared: Vec<RuleSetDefinition> = Vec::new();
    for (name, source) in packages {
        match prepare_named(name, source, env).await {
            Ok(definition) => prepared.push(definition),
            Err(e) => {
                warn!("Failed to prepare rule-set {}: {}", name, e);
                results.insert(
                    name.clone(),
                    RuleSetOutcome::Error {
                        message: e.to_string(),
                    },
                );
            }
        }
    }

    let names: Vec<&str> = packages.keys().map(String::as_str).collect();
    let definitions: Vec<&RuleSetDefinition> = prepared.iter().collect();
    let ignore = prune(ignore, &processed, &names, &definitions);

    let ctx = RunContext {
        processed: &processed,
        env,
        cancel,
        images: &images,
        ignore: &ignore,
    };
    for definition in &prepared {
        if cancel.is_cancelled() {
            debug!("Run cancelled before rule-set {}", definition.name);
            break;
        }
        let result = run_rule_set(&ctx, definition).await?;
        results.insert(definition.name.clone(), RuleSetOutcome::Success(result));
    }

    info!("Run complete: {} rule-set outcomes", results.len());
    Ok(MultiRunOutput { results, ignore })
}
