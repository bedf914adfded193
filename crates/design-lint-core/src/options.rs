//! Declarative rule option schemas and configuration validation.
//!
//! Rules declare the shape of their options with [`OptionSchema`] builders.
//! The declared options are merged into one JSON Schema object, with every
//! option required, and the rule's configuration is validated against it.
//!
//! ```ignore
//! let options = vec![
//!     OptionSchema::integer("maxDepth", "Max depth", "Maximum nesting depth")?
//!         .with_range(Some(1.0), None),
//!     OptionSchema::string_array("names", "Names", "Disallowed names")?,
//! ];
//! let schema = build_rule_option_schema(&options);
//! ```

use crate::config::{RuleConfig, RESERVED_OPTION_NAMES};
use crate::rule::Rule;
use serde_json::{json, Map, Value};
use std::fmt;

/// Errors from declaring an option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The option name is empty.
    #[error("option name must not be empty")]
    EmptyName,

    /// The option name collides with an engine-reserved name.
    #[error("option name `{name}` is reserved, reserved names are: active, severity, ruleTitle")]
    ReservedName {
        /// The rejected name.
        name: String,
    },

    /// An enum option declared no values.
    #[error("enum option `{name}` must declare at least one value")]
    EmptyEnum {
        /// The option name.
        name: String,
    },
}

/// One schema violation found in a rule configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    /// Pointer into the configuration where validation failed.
    pub path: String,
    /// What was wrong.
    pub message: String,
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path}: {}", self.message)
    }
}

/// Joins violations for error messages.
#[must_use]
pub fn format_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Kind-specific constraints of an option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    /// Floating-point number.
    Number {
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
    },
    /// Integer.
    Integer {
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
    },
    /// String, optionally constrained by a regex pattern.
    String {
        /// Regex the value must match.
        pattern: Option<String>,
    },
    /// Boolean.
    Boolean,
    /// One of a fixed set of strings.
    Enum {
        /// Allowed values.
        values: Vec<String>,
        /// Display titles, parallel to `values`.
        titles: Vec<String>,
    },
    /// Array of strings, each optionally constrained by a regex pattern.
    StringArray {
        /// Regex each item must match.
        pattern: Option<String>,
    },
    /// Array of objects whose fields are themselves declared options.
    ObjectArray {
        /// Item fields.
        props: Vec<OptionSchema>,
        /// Maximum number of items.
        max_length: Option<usize>,
    },
}

/// A declared rule option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSchema {
    name: String,
    title: String,
    description: String,
    default: Option<Value>,
    kind: OptionKind,
}

impl OptionSchema {
    fn new(
        name: &str,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: OptionKind,
    ) -> Result<Self, SchemaError> {
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if RESERVED_OPTION_NAMES.contains(&name) {
            return Err(SchemaError::ReservedName {
                name: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            title: title.into(),
            description: description.into(),
            default: None,
            kind,
        })
    }

    /// Declares a number option.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or reserved.
    pub fn number(
        name: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        Self::new(
            name,
            title,
            description,
            OptionKind::Number {
                minimum: None,
                maximum: None,
            },
        )
    }

    /// Declares an integer option.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or reserved.
    pub fn integer(
        name: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        Self::new(
            name,
            title,
            description,
            OptionKind::Integer {
                minimum: None,
                maximum: None,
            },
        )
    }

    /// Declares a string option.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or reserved.
    pub fn string(
        name: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        Self::new(name, title, description, OptionKind::String { pattern: None })
    }

    /// Declares a boolean option.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or reserved.
    pub fn boolean(
        name: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        Self::new(name, title, description, OptionKind::Boolean)
    }

    /// Declares a string enum option. `titles` may be empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or reserved, or `values` is empty.
    pub fn string_enum<I, S>(
        name: &str,
        title: impl Into<String>,
        description: impl Into<String>,
        values: I,
        titles: I,
    ) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(SchemaError::EmptyEnum {
                name: name.to_string(),
            });
        }
        let titles = titles.into_iter().map(Into::into).collect();
        Self::new(name, title, description, OptionKind::Enum { values, titles })
    }

    /// Declares a string array option.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or reserved.
    pub fn string_array(
        name: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        Self::new(
            name,
            title,
            description,
            OptionKind::StringArray { pattern: None },
        )
    }

    /// Declares an array-of-objects option whose item fields are `props`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or reserved.
    pub fn object_array(
        name: &str,
        title: impl Into<String>,
        description: impl Into<String>,
        props: Vec<OptionSchema>,
    ) -> Result<Self, SchemaError> {
        Self::new(
            name,
            title,
            description,
            OptionKind::ObjectArray {
                props,
                max_length: None,
            },
        )
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets inclusive bounds. Applies to number and integer options only.
    #[must_use]
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if let OptionKind::Number { minimum, maximum } | OptionKind::Integer { minimum, maximum } =
            &mut self.kind
        {
            *minimum = min;
            *maximum = max;
        }
        self
    }

    /// Sets a regex pattern. Applies to string and string array options only.
    #[must_use]
    pub fn with_pattern(mut self, regex: impl Into<String>) -> Self {
        if let OptionKind::String { pattern } | OptionKind::StringArray { pattern } = &mut self.kind
        {
            *pattern = Some(regex.into());
        }
        self
    }

    /// Sets the maximum item count. Applies to object array options only.
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        if let OptionKind::ObjectArray { max_length, .. } = &mut self.kind {
            *max_length = Some(max);
        }
        self
    }

    /// The option name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The option kind.
    #[must_use]
    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    /// JSON Schema of this one property.
    #[must_use]
    pub fn to_schema(&self) -> Value {
        let mut schema = Map::new();
        match &self.kind {
            OptionKind::Number { minimum, maximum } | OptionKind::Integer { minimum, maximum } => {
                let ty = if matches!(self.kind, OptionKind::Integer { .. }) {
                    "integer"
                } else {
                    "number"
                };
                schema.insert("type".into(), json!(ty));
                if let Some(min) = minimum {
                    schema.insert("minimum".into(), json!(min));
                }
                if let Some(max) = maximum {
                    schema.insert("maximum".into(), json!(max));
                }
            }
            OptionKind::String { pattern } => {
                schema.insert("type".into(), json!("string"));
                if let Some(pattern) = pattern {
                    schema.insert("pattern".into(), json!(pattern));
                }
            }
            OptionKind::Boolean => {
                schema.insert("type".into(), json!("boolean"));
            }
            OptionKind::Enum { values, titles } => {
                schema.insert("type".into(), json!("string"));
                schema.insert("enum".into(), json!(values));
                if !titles.is_empty() {
                    schema.insert("enumNames".into(), json!(titles));
                }
            }
            OptionKind::StringArray { pattern } => {
                let mut items = json!({"type": "string"});
                if let Some(pattern) = pattern {
                    items["pattern"] = json!(pattern);
                }
                schema.insert("type".into(), json!("array"));
                schema.insert("items".into(), items);
            }
            OptionKind::ObjectArray { props, max_length } => {
                schema.insert("type".into(), json!("array"));
                schema.insert(
                    "items".into(),
                    json!({"type": "object", "properties": properties(props)}),
                );
                if let Some(max) = max_length {
                    schema.insert("maxItems".into(), json!(max));
                }
            }
        }
        schema.insert("title".into(), json!(self.title));
        schema.insert("description".into(), json!(self.description));
        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }
        Value::Object(schema)
    }
}

fn properties(options: &[OptionSchema]) -> Map<String, Value> {
    options
        .iter()
        .map(|o| (o.name.clone(), o.to_schema()))
        .collect()
}

/// Merges declared options into one object schema with every option required.
#[must_use]
pub fn build_rule_option_schema(options: &[OptionSchema]) -> Value {
    let required: Vec<&str> = options.iter().map(OptionSchema::name).collect();
    json!({
        "type": "object",
        "properties": properties(options),
        "required": required,
    })
}

/// Validates an options object against a schema.
///
/// # Errors
///
/// Returns every schema violation, or a single violation if the schema itself
/// does not compile.
pub fn validate_options(schema: &Value, options: &Value) -> Result<(), Vec<ConfigViolation>> {
    let validator = jsonschema::validator_for(schema).map_err(|e| {
        vec![ConfigViolation {
            path: String::new(),
            message: format!("invalid option schema: {e}"),
        }]
    })?;

    let violations: Vec<ConfigViolation> = validator
        .iter_errors(options)
        .map(|e| ConfigViolation {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Validates a rule's configuration against the options the rule declares.
///
/// # Errors
///
/// Returns the schema violations, including one for an option declaration
/// the rule could not build.
pub fn is_rule_config_valid(
    config: &RuleConfig,
    rule: &dyn Rule,
) -> Result<(), Vec<ConfigViolation>> {
    let options = rule.options().map_err(|e| {
        vec![ConfigViolation {
            path: String::new(),
            message: e.to_string(),
        }]
    })?;
    let schema = build_rule_option_schema(&options);
    validate_options(&schema, &config.options_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<OptionSchema> {
        vec![
            OptionSchema::integer("maxDepth", "Max depth", "Maximum nesting depth")
                .unwrap()
                .with_range(Some(1.0), Some(20.0))
                .with_default(5),
            OptionSchema::string_array("names", "Names", "Disallowed names").unwrap(),
            OptionSchema::string_enum(
                "mode",
                "Mode",
                "Matching mode",
                ["exact", "prefix"],
                ["Exact", "Prefix"],
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_reserved_names_rejected() {
        for name in ["active", "severity", "ruleTitle"] {
            let err = OptionSchema::number(name, "t", "d").unwrap_err();
            assert_eq!(
                err,
                SchemaError::ReservedName {
                    name: name.to_string()
                }
            );
        }
        assert_eq!(
            OptionSchema::boolean("", "t", "d").unwrap_err(),
            SchemaError::EmptyName
        );
    }

    #[test]
    fn test_empty_enum_rejected() {
        let err = OptionSchema::string_enum("mode", "t", "d", Vec::<String>::new(), Vec::new())
            .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyEnum { .. }));
    }

    #[test]
    fn test_build_schema_requires_every_option() {
        let schema = build_rule_option_schema(&options());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["maxDepth", "names", "mode"]));
        assert_eq!(schema["properties"]["maxDepth"]["type"], "integer");
        assert_eq!(schema["properties"]["maxDepth"]["minimum"], 1.0);
        assert_eq!(schema["properties"]["maxDepth"]["default"], 5);
        assert_eq!(schema["properties"]["names"]["items"]["type"], "string");
        assert_eq!(schema["properties"]["mode"]["enum"], json!(["exact", "prefix"]));
    }

    #[test]
    fn test_valid_config() {
        let schema = build_rule_option_schema(&options());
        let config = json!({"maxDepth": 3, "names": ["Copy"], "mode": "exact"});
        assert_eq!(validate_options(&schema, &config), Ok(()));
    }

    #[test]
    fn test_missing_option_reported() {
        let schema = build_rule_option_schema(&options());
        let config = json!({"maxDepth": 3, "mode": "exact"});
        let violations = validate_options(&schema, &config).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("names"));
    }

    #[test]
    fn test_invalid_values_reported_with_paths() {
        let schema = build_rule_option_schema(&options());
        let config = json!({"maxDepth": 99, "names": ["ok", 3], "mode": "fuzzy"});
        let violations = validate_options(&schema, &config).unwrap_err();
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"/maxDepth"));
        assert!(paths.contains(&"/names/1"));
        assert!(paths.contains(&"/mode"));
    }

    #[test]
    fn test_object_array_schema() {
        let option = OptionSchema::object_array(
            "pairs",
            "Pairs",
            "Name pairs",
            vec![
                OptionSchema::string("from", "From", "").unwrap(),
                OptionSchema::string("to", "To", "").unwrap(),
            ],
        )
        .unwrap()
        .with_max_length(2);
        let schema = build_rule_option_schema(&[option]);
        assert_eq!(schema["properties"]["pairs"]["maxItems"], 2);

        let ok = json!({"pairs": [{"from": "a", "to": "b"}]});
        assert!(validate_options(&schema, &ok).is_ok());
        let too_many = json!({"pairs": [{}, {}, {}]});
        assert!(validate_options(&schema, &too_many).is_err());
    }

    #[test]
    fn test_string_pattern() {
        let option = OptionSchema::string("prefix", "Prefix", "")
            .unwrap()
            .with_pattern("^[A-Z]");
        let schema = build_rule_option_schema(&[option]);
        assert!(validate_options(&schema, &json!({"prefix": "Abc"})).is_ok());
        assert!(validate_options(&schema, &json!({"prefix": "abc"})).is_err());
    }

    #[test]
    fn test_violation_display() {
        let v = ConfigViolation {
            path: String::new(),
            message: "missing".to_string(),
        };
        assert_eq!(v.to_string(), "/: missing");
    }
}
