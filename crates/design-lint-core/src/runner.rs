//! Runs one rule-set against a processed document.

use crate::cancellation::CancellationToken;
use crate::context::RuleSetEnv;
use crate::ignore::IgnoreConfig;
use crate::images::ImageMetadataCache;
use crate::index::ProcessedFile;
use crate::rule::{supports_runtime, CheckError, RuleBox};
use crate::rule_set::RuleSetDefinition;
use crate::rule_utils::RuleUtilsFactory;
use crate::types::{self, Profile, RuleError, RuleMetadata, RuleSetMetadata, RuleSetResult};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures that abort a rule-set run instead of being captured as rule errors.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum EngineError {
    /// A rule reported a violation on an object it was told to ignore.
    #[error("rule `{rule}` in rule-set `{rule_set}` reported ignored object `{object_id}`")]
    #[diagnostic(
        code(design_lint::engine::reported_ignored_object),
        help("iterate through `RuleUtils::objects` so ignored objects are skipped")
    )]
    ReportedIgnoredObject {
        /// Rule-set name.
        rule_set: String,
        /// Rule name.
        rule: String,
        /// Id of the ignored object.
        object_id: String,
    },
}

/// Everything a rule-set run reads besides the definition itself.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    /// The indexed document.
    pub processed: &'a ProcessedFile<'a>,
    /// Run environment.
    pub env: &'a RuleSetEnv,
    /// Cancellation flag, checked before each rule.
    pub cancel: &'a CancellationToken,
    /// Memoized image metadata.
    pub images: &'a ImageMetadataCache<'a>,
    /// Suppression directives, already pruned.
    pub ignore: &'a IgnoreConfig,
}

/// Runs the active rules of a rule-set one at a time.
///
/// Rules run when active in the rule-set config, compatible with the run's
/// runtime, and not fully ignored. A failing or panicking rule becomes a
/// [`RuleError`] and never stops its siblings. Cancellation skips every rule
/// not yet started.
///
/// # Errors
///
/// Returns [`EngineError::ReportedIgnoredObject`] when a rule reports an
/// object on its ignore list.
pub async fn run_rule_set(
    ctx: &RunContext<'_>,
    definition: &RuleSetDefinition,
) -> Result<RuleSetResult, EngineError> {
    info!("Running rule-set {}", definition.name);

    let (metadata, selected) = select_rules(ctx, definition);
    let violations = Mutex::new(Vec::new());
    let mut rule_errors = Vec::new();
    let mut rule_timings = BTreeMap::new();

    {
        let factory = RuleUtilsFactory::new(
            ctx.processed,
            definition,
            ctx.env,
            &violations,
            ctx.cancel,
            ctx.images,
            ctx.ignore,
        );

        for rule in selected {
            if ctx.cancel.is_cancelled() {
                debug!("Rule-set {} cancelled before {}", definition.name, rule.name());
                break;
            }

            let name = rule.name();
            let start = Instant::now();
            let outcome = match factory.for_rule(name) {
                Ok(utils) => {
                    let outcome = AssertUnwindSafe(rule.check(&utils)).catch_unwind().await;
                    // Whatever the rule returned, a reported ignored object aborts the run.
                    if let Some(object_id) = utils.ignored_report() {
                        return Err(EngineError::ReportedIgnoredObject {
                            rule_set: definition.name.clone(),
                            rule: name.to_string(),
                            object_id,
                        });
                    }
                    outcome
                }
                Err(e) => Ok(Err(e)),
            };
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            debug!("Rule {}/{} took {:.2}ms", definition.name, name, elapsed_ms);
            rule_timings.insert(name.to_string(), elapsed_ms);

            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(CheckError::ReportedIgnoredObject {
                    rule_set,
                    rule,
                    object_id,
                })) => {
                    return Err(EngineError::ReportedIgnoredObject {
                        rule_set,
                        rule,
                        object_id,
                    })
                }
                Ok(Err(e)) => format!("{e:#}"),
                Err(panic) => format!("rule panicked: {}", panic_message(panic.as_ref())),
            };
            warn!("Rule {}/{} failed: {}", definition.name, name, message);
            rule_errors.push(RuleError {
                rule_set: definition.name.clone(),
                rule: name.to_string(),
                message,
            });
        }
    }

    let violations = violations
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    let passed = types::passed(&violations);
    info!(
        "Rule-set {} complete: {} violations, {} rule errors",
        definition.name,
        violations.len(),
        rule_errors.len()
    );

    Ok(RuleSetResult {
        passed,
        violations,
        rule_errors,
        metadata,
        profile: Profile {
            rule_timings,
            object_count: ctx.processed.profile.object_count,
            index_time_ms: ctx.processed.profile.elapsed_ms,
        },
    })
}

/// Collects metadata for every active, runtime-compatible rule and returns
/// the subset that is not fully ignored.
fn select_rules<'d>(
    ctx: &RunContext<'_>,
    definition: &'d RuleSetDefinition,
) -> (RuleSetMetadata, Vec<&'d RuleBox>) {
    let mut metadata = RuleSetMetadata {
        rules: BTreeMap::new(),
        config: definition.config.clone(),
    };
    let mut selected = Vec::new();

    for rule in &definition.rules {
        let name = rule.name();
        let Some(config) = definition.config.get(name).filter(|c| c.active) else {
            debug!("Skipping inactive rule: {}/{}", definition.name, name);
            continue;
        };
        if !supports_runtime(rule.as_ref(), ctx.env.runtime) {
            debug!("Skipping rule unsupported in {:?}: {}/{}", ctx.env.runtime, definition.name, name);
            continue;
        }

        metadata.rules.insert(
            name.to_string(),
            RuleMetadata {
                name: name.to_string(),
                title: config
                    .rule_title
                    .clone()
                    .unwrap_or_else(|| rule.title(config)),
                description: rule.description(config),
                debug: rule.debug(),
                runtime: rule.runtime(),
            },
        );

        if ctx.ignore.is_rule_fully_ignored(&definition.name, name) {
            debug!("Skipping ignored rule: {}/{}", definition.name, name);
            continue;
        }
        selected.push(rule);
    }

    (metadata, selected)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
