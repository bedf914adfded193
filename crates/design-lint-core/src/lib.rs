//! # design-lint-core
//!
//! Rule engine for linting vector-design documents.
//!
//! A document tree is indexed once into typed object caches and a pointer
//! map. Rule-sets then run their rules against the index through a per-rule
//! [`RuleUtils`] view that applies ignore directives, validates rule options
//! and collects violations. It includes:
//!
//! - [`ProcessedFile`] for the single-pass index of a document
//! - [`Rule`] trait for design convention checks
//! - [`run_rule_set`] for running one rule-set
//! - [`run_multiple`] for preparing and running several rule-set packages
//! - [`IgnoreConfig`] and its pruning stages
//!
//! ## Example
//!
//! ```ignore
//! use design_lint_core::{
//!     run_multiple, CancellationToken, DocumentFile, IgnoreConfig, NoImageMetadata,
//!     RuleSetEnv, RuleSetSource,
//! };
//!
//! let packages = BTreeMap::from([("core".to_string(), RuleSetSource::definition(core))]);
//! let output = run_multiple(
//!     &packages,
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

mod cancellation;
mod config;
mod context;
mod images;
mod options;
mod orchestrator;
mod rule;
mod rule_set;
mod rule_utils;
mod runner;
mod types;

/// Suppression directives and their pruning stages.
pub mod ignore;
/// Document indexing.
pub mod index;
/// Utility modules for rule implementations.
pub mod utils;

pub use cancellation::CancellationToken;
pub use config::{ConfigError, RuleConfig, RuleSetConfig, RESERVED_OPTION_NAMES};
pub use context::{DocumentFile, RuleSetEnv, Runtime};
pub use ignore::{IgnoreConfig, RuleIgnore, RuleSetIgnore};
pub use images::{
    ImageMetadata, ImageMetadataCache, ImageMetadataError, ImageMetadataProvider, NoImageMetadata,
};
pub use index::{Node, NodeClass, ProcessedFile};
pub use options::{
    build_rule_option_schema, format_violations, is_rule_config_valid, validate_options,
    ConfigViolation, OptionKind, OptionSchema, SchemaError,
};
pub use orchestrator::{run_multiple, MultiRunOutput, RejectionCode, RuleSetOutcome, RunRejection};
pub use rule::{supports_runtime, CheckError, Rule, RuleBox};
pub use rule_set::{
    prepare, prepare_named, PrepareError, RuleSetDefinition, RuleSetProducer, RuleSetSource,
};
pub use rule_utils::{ObjectIter, Objects, RuleUtils, RuleUtilsFactory};
pub use runner::{run_rule_set, EngineError, RunContext};
pub use types::{
    passed, Profile, RuleError, RuleMetadata, RuleSetMetadata, RuleSetResult, Severity, Violation,
    ViolationLocation,
};
