//! Inputs describing what is analyzed and where.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// A parsed design document.
///
/// `contents` is shaped `{document, meta, user, workspace?}`; only class
/// objects (those carrying a `_class` discriminator) take part in indexing.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    /// Where the document was read from, forwarded to image probing.
    pub filepath: Option<PathBuf>,
    /// The parsed document tree.
    pub contents: Value,
}

impl DocumentFile {
    /// Creates a document with no known filepath.
    #[must_use]
    pub fn new(contents: Value) -> Self {
        Self {
            filepath: None,
            contents,
        }
    }

    /// Sets the filepath.
    #[must_use]
    pub fn with_filepath(mut self, path: impl Into<PathBuf>) -> Self {
        self.filepath = Some(path.into());
        self
    }
}

/// Host runtime a run executes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    /// Interactive editor host.
    Editor,
    /// Batch host without an editor.
    #[default]
    Headless,
}

/// Environment a rule-set is prepared and run in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetEnv {
    /// Locale used for titles, descriptions and messages.
    #[serde(default)]
    pub locale: Option<String>,
    /// Host runtime.
    #[serde(default)]
    pub runtime: Runtime,
}

impl RuleSetEnv {
    /// Creates an environment for a runtime.
    #[must_use]
    pub fn new(runtime: Runtime) -> Self {
        Self {
            locale: None,
            runtime,
        }
    }

    /// Sets the locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}
