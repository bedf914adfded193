//! Rule-set definitions and the package sources that produce them.

use crate::config::RuleSetConfig;
use crate::context::RuleSetEnv;
use crate::rule::RuleBox;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A named collection of rules together with their configuration.
#[derive(Clone)]
pub struct RuleSetDefinition {
    /// Rule-set name, unique within one run.
    pub name: String,
    /// Rules in declaration order.
    pub rules: Vec<RuleBox>,
    /// Per-rule configuration.
    pub config: RuleSetConfig,
}

impl RuleSetDefinition {
    /// Creates an empty rule-set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            config: RuleSetConfig::default(),
        }
    }

    /// Adds a rule, replacing any rule with the same name in place.
    #[must_use]
    pub fn with_rule(mut self, rule: RuleBox) -> Self {
        self.insert_rule(rule);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RuleSetConfig) -> Self {
        self.config = config;
        self
    }

    /// Looks up a rule by name.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&RuleBox> {
        self.rules.iter().find(|r| r.name() == name)
    }

    /// Names of all rules, in declaration order.
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name())
    }

    /// Merges a later definition over this one.
    ///
    /// The later name wins. Later rules replace same-named rules in place and
    /// are otherwise appended; later rule configs replace earlier ones.
    pub fn merge(&mut self, later: Self) {
        self.name = later.name;
        for rule in later.rules {
            self.insert_rule(rule);
        }
        self.config.merge(later.config);
    }

    fn insert_rule(&mut self, rule: RuleBox) {
        match self.rules.iter_mut().find(|r| r.name() == rule.name()) {
            Some(slot) => *slot = rule,
            None => self.rules.push(rule),
        }
    }
}

impl std::fmt::Debug for RuleSetDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSetDefinition")
            .field("name", &self.name)
            .field("rules", &self.rule_names().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

/// Produces a rule-set definition for an environment.
///
/// Implemented for any `Fn(&RuleSetEnv) -> anyhow::Result<RuleSetDefinition>`.
#[async_trait]
pub trait RuleSetProducer: Send + Sync {
    /// Builds the definition.
    async fn produce(&self, env: &RuleSetEnv) -> anyhow::Result<RuleSetDefinition>;
}

#[async_trait]
impl<F> RuleSetProducer for F
where
    F: Fn(&RuleSetEnv) -> anyhow::Result<RuleSetDefinition> + Send + Sync,
{
    async fn produce(&self, env: &RuleSetEnv) -> anyhow::Result<RuleSetDefinition> {
        self(env)
    }
}

struct Fixed(RuleSetDefinition);

#[async_trait]
impl RuleSetProducer for Fixed {
    async fn produce(&self, _env: &RuleSetEnv) -> anyhow::Result<RuleSetDefinition> {
        Ok(self.0.clone())
    }
}

/// A rule-set package: one producer or an arbitrarily nested list of them.
#[derive(Clone)]
pub enum RuleSetSource {
    /// A single producer.
    Single(Arc<dyn RuleSetProducer>),
    /// Sources merged left to right, later entries taking precedence.
    List(Vec<RuleSetSource>),
}

impl RuleSetSource {
    /// Wraps a producer.
    pub fn producer(producer: impl RuleSetProducer + 'static) -> Self {
        Self::Single(Arc::new(producer))
    }

    /// Wraps a ready-made definition.
    #[must_use]
    pub fn definition(definition: RuleSetDefinition) -> Self {
        Self::producer(Fixed(definition))
    }

    /// A source that layers `extension` over `self`.
    #[must_use]
    pub fn extend(self, extension: Self) -> Self {
        Self::List(vec![self, extension])
    }

    /// All producers in merge order.
    #[must_use]
    pub fn flatten(&self) -> Vec<Arc<dyn RuleSetProducer>> {
        let mut producers = Vec::new();
        let mut stack = vec![self];
        while let Some(source) = stack.pop() {
            match source {
                Self::Single(producer) => producers.push(Arc::clone(producer)),
                Self::List(sources) => stack.extend(sources.iter().rev()),
            }
        }
        producers
    }
}

impl std::fmt::Debug for RuleSetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Single(..)"),
            Self::List(sources) => f.debug_tuple("List").field(sources).finish(),
        }
    }
}

/// Errors resolving a rule-set package.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PrepareError {
    /// A producer failed.
    #[error("failed to produce rule-set: {source:#}")]
    #[diagnostic(code(design_lint::prepare::producer))]
    Producer {
        /// Underlying failure.
        source: anyhow::Error,
    },

    /// The package contained no producers.
    #[error("rule-set package is empty")]
    #[diagnostic(code(design_lint::prepare::empty))]
    Empty,

    /// The package was registered under a different name than it resolved to.
    #[error("rule-set registered as `{declared}` resolved to `{resolved}`")]
    #[diagnostic(
        code(design_lint::prepare::name_mismatch),
        help("register the package under the name its rule-set declares")
    )]
    NameMismatch {
        /// Name the package was registered under.
        declared: String,
        /// Name of the resolved rule-set.
        resolved: String,
    },
}

/// Resolves a package into one definition by flattening, invoking and merging
/// its producers in order.
///
/// # Errors
///
/// Returns [`PrepareError::Producer`] if any producer fails and
/// [`PrepareError::Empty`] for a package without producers.
pub async fn prepare(
    source: &RuleSetSource,
    env: &RuleSetEnv,
) -> Result<RuleSetDefinition, PrepareError> {
    let mut merged: Option<RuleSetDefinition> = None;
    for producer in source.flatten() {
        let definition = producer
            .produce(env)
            .await
            .map_err(|source| PrepareError::Producer { source })?;
        match merged.as_mut() {
            Some(base) => base.merge(definition),
            None => merged = Some(definition),
        }
    }

    let definition = merged.ok_or(PrepareError::Empty)?;
    debug!(
        "Prepared rule-set {} with {} rules",
        definition.name,
        definition.rules.len()
    );
    Ok(definition)
}

/// Resolves a package and checks it against the name it was registered under.
///
/// # Errors
///
/// Returns everything [`prepare`] does, plus [`PrepareError::NameMismatch`].
pub async fn prepare_named(
    declared: &str,
    source: &RuleSetSource,
    env: &RuleSetEnv,
) -> Result<RuleSetDefinition, PrepareError> {
    let definition = prepare(source, env).await?;
    if definition.name != declared {
        return Err(PrepareError::NameMismatch {
            declared: declared.to_string(),
            resolved: definition.name,
        });
    }
    Ok(definition)
}
