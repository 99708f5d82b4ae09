//! Parameter schemas and input validation for tools.
//!
//! A [`ParameterSchema`] maps parameter names to [`ParamRule`]s. Validation
//! runs before a tool's implementation routine: every declared parameter is
//! checked, all violations are collected, and the routine only ever sees a
//! [`ToolParams`] value that satisfied the schema.
//!
//! ```rust
//! use mcp_tool_server::domains::tools::{ParamRule, ParameterSchema};
//!
//! let schema = ParameterSchema::new()
//!     .param("a", ParamRule::number("First number"))
//!     .param("b", ParamRule::number("Second number"));
//!
//! let args = serde_json::json!({ "a": 2, "b": "x" });
//! let err = schema.validate(args.as_object()).unwrap_err();
//! assert_eq!(err.parameters(), vec!["b"]);
//! ```

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use rmcp::model::JsonObject;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

use super::error::ToolError;

/// Pseudo-parameter name used when the arguments themselves are malformed.
pub const ARGUMENTS_PARAMETER: &str = "(arguments)";

// ============================================================================
// Validation errors
// ============================================================================

/// A single rule violation for one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Name of the offending parameter (array items are reported as `name[i]`).
    pub parameter: String,

    /// The rule that rejected the value (`required`, `type`, `minimum`, ...).
    pub rule: String,

    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    fn new(parameter: impl Into<String>, rule: &str, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter '{}' failed rule '{}': {}",
            self.parameter, self.rule, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

/// All violations found while validating one set of arguments. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Violations reported when the arguments are not a JSON object at all.
    pub fn not_an_object(value: &Value) -> Self {
        Self(vec![ValidationError::new(
            ARGUMENTS_PARAMETER,
            "type",
            format!("expected object, got {}", json_type(value)),
        )])
    }

    /// The individual violations, ordered by parameter name.
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Names of the parameters that failed validation.
    pub fn parameters(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.parameter.as_str()).collect()
    }

    /// The violation reported for `parameter`, if any.
    pub fn for_parameter(&self, parameter: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.parameter == parameter)
    }

    /// Structured form attached to protocol errors.
    pub fn to_json(&self) -> Value {
        json!({ "violations": self.0 })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ============================================================================
// Rules
// ============================================================================

/// The JSON type a parameter must have.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    /// Array whose items must all satisfy the inner rule.
    Array(Box<ParamRule>),
    Object,
    /// Any JSON value, including null.
    Any,
}

impl ParamKind {
    fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Number => Some("number"),
            Self::Integer => Some("integer"),
            Self::Boolean => Some("boolean"),
            Self::Array(_) => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }
}

/// Validation rule for a single parameter.
///
/// Rules are required unless marked [`optional`](Self::optional) or given a
/// [`default`](Self::with_default).
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRule {
    kind: ParamKind,
    description: String,
    required: bool,
    default: Option<Value>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    one_of: Option<Vec<Value>>,
}

impl ParamRule {
    fn new(kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            required: true,
            default: None,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            one_of: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(ParamKind::String, description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::new(ParamKind::Number, description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(ParamKind::Integer, description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(ParamKind::Boolean, description)
    }

    pub fn array(items: ParamRule, description: impl Into<String>) -> Self {
        Self::new(ParamKind::Array(Box::new(items)), description)
    }

    pub fn object(description: impl Into<String>) -> Self {
        Self::new(ParamKind::Object, description)
    }

    pub fn any(description: impl Into<String>) -> Self {
        Self::new(ParamKind::Any, description)
    }

    /// Allow the parameter to be omitted.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value used when the parameter is omitted. Implies [`optional`](Self::optional).
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    /// Inclusive lower bound for numbers.
    pub fn min(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Inclusive upper bound for numbers.
    pub fn max(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Minimum length: characters for strings, items for arrays.
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Maximum length: characters for strings, items for arrays.
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Restrict the value to a fixed set.
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Check a present value against this rule.
    ///
    /// Returns the normalized value on success (integral floats become
    /// integers for [`ParamKind::Integer`]). Compiles the rule on every call;
    /// use [`ParamRule::compile`] to validate repeatedly.
    pub fn check(&self, parameter: &str, value: &Value) -> Result<Value, ValidationError> {
        self.compile()
            .map_err(|e| ValidationError::new(parameter, "schema", e.to_string()))?
            .check(parameter, value)
    }

    /// Compile this rule's JSON Schema into a reusable validator.
    pub fn compile(&self) -> Result<CompiledRule, ToolError> {
        let schema = self.to_json_schema();
        let validator = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
            .map_err(|e| {
                ToolError::invalid_definition(format!("rule does not compile: {}", e))
            })?;

        Ok(CompiledRule {
            rule: self.clone(),
            validator,
        })
    }

    /// JSON Schema fragment describing this rule.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = JsonObject::new();

        if let Some(type_name) = self.kind.type_name() {
            schema.insert("type".into(), json!(type_name));
        }
        if let ParamKind::Array(items) = &self.kind {
            schema.insert("items".into(), items.to_json_schema());
        }
        schema.insert("description".into(), json!(self.description));

        if let Some(min) = self.minimum {
            schema.insert("minimum".into(), json!(min));
        }
        if let Some(max) = self.maximum {
            schema.insert("maximum".into(), json!(max));
        }

        let (min_key, max_key) = match self.kind {
            ParamKind::Array(_) => ("minItems", "maxItems"),
            _ => ("minLength", "maxLength"),
        };
        if let Some(min) = self.min_length {
            schema.insert(min_key.into(), json!(min));
        }
        if let Some(max) = self.max_length {
            schema.insert(max_key.into(), json!(max));
        }

        if let Some(allowed) = &self.one_of {
            schema.insert("enum".into(), Value::Array(allowed.clone()));
        }
        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }

        Value::Object(schema)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_mismatch(parameter: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::new(
        parameter,
        "type",
        format!("expected {}, got {}", expected, json_type(value)),
    )
}

fn length_of(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        _ => 0,
    }
}

/// 2^63 and 2^64 as exact floats.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Integral value as a JSON integer, or `None` if it has a fraction or does
/// not fit in 64 bits.
fn as_integer(value: &Value) -> Option<Value> {
    if value.is_i64() || value.is_u64() {
        return Some(value.clone());
    }
    let f = value.as_f64()?;
    if f.fract() != 0.0 {
        None
    } else if (-I64_LIMIT..I64_LIMIT).contains(&f) {
        Some(json!(f as i64))
    } else if (I64_LIMIT..U64_LIMIT).contains(&f) {
        Some(json!(f as u64))
    } else {
        None
    }
}

fn normalize(kind: &ParamKind, parameter: &str, value: &Value) -> Result<Value, ValidationError> {
    match (kind, value) {
        (ParamKind::Integer, _) => as_integer(value).ok_or_else(|| {
            ValidationError::new(parameter, "type", "expected integer within 64-bit range")
        }),
        (ParamKind::Array(items), Value::Array(values)) => values
            .iter()
            .enumerate()
            .map(|(i, item)| normalize(&items.kind, &format!("{}[{}]", parameter, i), item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        _ => Ok(value.clone()),
    }
}

// ============================================================================
// Compiled rules
// ============================================================================

/// A [`ParamRule`] together with its compiled JSON Schema validator.
pub struct CompiledRule {
    rule: ParamRule,
    validator: JSONSchema,
}

impl CompiledRule {
    pub fn rule(&self) -> &ParamRule {
        &self.rule
    }

    /// Check a present value, reporting the most relevant violation.
    pub fn check(&self, parameter: &str, value: &Value) -> Result<Value, ValidationError> {
        if let Err(errors) = self.validator.validate(value) {
            let errors: Vec<_> = errors.collect();
            let first = errors
                .iter()
                .find(|e| matches!(e.kind, ValidationErrorKind::Type { .. }))
                .or_else(|| errors.first());
            if let Some(error) = first {
                return Err(self.violation(parameter, error));
            }
        }

        normalize(&self.rule.kind, parameter, value)
    }

    fn violation(&self, parameter: &str, error: &jsonschema::ValidationError<'_>) -> ValidationError {
        // Walk down to the rule the failing instance belongs to (array items).
        let mut name = parameter.to_string();
        let mut rule = &self.rule;
        for segment in error.instance_path.to_string().split('/').filter(|s| !s.is_empty()) {
            name.push_str(&format!("[{}]", segment));
            if let ParamKind::Array(items) = &rule.kind {
                rule = items;
            }
        }

        let instance = error.instance.as_ref();
        let unit = if instance.is_array() { "items" } else { "characters" };

        match &error.kind {
            ValidationErrorKind::Type { .. } => {
                type_mismatch(&name, rule.kind.type_name().unwrap_or("value"), instance)
            }
            ValidationErrorKind::Minimum { .. } => ValidationError::new(
                name,
                "minimum",
                format!(
                    "expected a value >= {}, got {}",
                    rule.minimum.unwrap_or_default(),
                    instance
                ),
            ),
            ValidationErrorKind::Maximum { .. } => ValidationError::new(
                name,
                "maximum",
                format!(
                    "expected a value <= {}, got {}",
                    rule.maximum.unwrap_or_default(),
                    instance
                ),
            ),
            ValidationErrorKind::MinLength { .. } | ValidationErrorKind::MinItems { .. } => {
                ValidationError::new(
                    name,
                    "min_length",
                    format!(
                        "expected at least {} {}, got {}",
                        rule.min_length.unwrap_or_default(),
                        unit,
                        length_of(instance)
                    ),
                )
            }
            ValidationErrorKind::MaxLength { .. } | ValidationErrorKind::MaxItems { .. } => {
                ValidationError::new(
                    name,
                    "max_length",
                    format!(
                        "expected at most {} {}, got {}",
                        rule.max_length.unwrap_or_default(),
                        unit,
                        length_of(instance)
                    ),
                )
            }
            ValidationErrorKind::Enum { .. } => {
                let list = rule
                    .one_of
                    .iter()
                    .flatten()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                ValidationError::new(
                    name,
                    "one_of",
                    format!("expected one of [{}], got {}", list, instance),
                )
            }
            _ => ValidationError::new(name, "schema", error.to_string()),
        }
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("rule", &self.rule)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Parameter schema
// ============================================================================

/// Named set of parameter rules for one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    params: BTreeMap<String, ParamRule>,
}

impl ParameterSchema {
    /// Create an empty schema (a tool with no parameters).
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter. Names must be unique within a schema.
    pub fn param(mut self, name: impl Into<String>, rule: ParamRule) -> Self {
        let name = name.into();
        debug_assert!(
            !self.params.contains_key(&name),
            "parameter '{}' declared twice",
            name
        );
        self.params.insert(name, rule);
        self
    }

    /// Declared parameter names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn rule(&self, name: &str) -> Option<&ParamRule> {
        self.params.get(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// JSON Schema (`type: object`) advertised as the tool's input schema.
    pub fn to_json_schema(&self) -> JsonObject {
        let properties: JsonObject = self
            .params
            .iter()
            .map(|(name, rule)| (name.clone(), rule.to_json_schema()))
            .collect();

        let required: Vec<Value> = self
            .params
            .iter()
            .filter(|(_, rule)| rule.required)
            .map(|(name, _)| json!(name))
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        schema
    }

    /// Compile every rule once, for repeated validation.
    pub fn compile(&self) -> Result<CompiledSchema, ToolError> {
        let rules = self
            .params
            .iter()
            .map(|(name, rule)| {
                rule.compile()
                    .map(|compiled| (name.clone(), compiled))
                    .map_err(|e| {
                        ToolError::invalid_definition(format!("parameter '{}': {}", name, e))
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(CompiledSchema { rules })
    }

    /// Validate raw arguments, collecting every violation.
    ///
    /// Missing arguments are treated as an empty object. Undeclared keys are
    /// dropped; `null` for an optional parameter counts as absent.
    pub fn validate(&self, arguments: Option<&JsonObject>) -> Result<ToolParams, ValidationErrors> {
        match self.compile() {
            Ok(compiled) => compiled.validate(arguments),
            Err(e) => Err(ValidationErrors(vec![ValidationError::new(
                ARGUMENTS_PARAMETER,
                "schema",
                e.to_string(),
            )])),
        }
    }
}

/// A [`ParameterSchema`] with every rule compiled. Built once per tool at
/// registration.
#[derive(Debug)]
pub struct CompiledSchema {
    rules: BTreeMap<String, CompiledRule>,
}

impl CompiledSchema {
    /// See [`ParameterSchema::validate`].
    pub fn validate(&self, arguments: Option<&JsonObject>) -> Result<ToolParams, ValidationErrors> {
        let empty = JsonObject::new();
        let arguments = arguments.unwrap_or(&empty);

        let mut values = JsonObject::new();
        let mut errors = Vec::new();

        for (name, compiled) in &self.rules {
            let rule = compiled.rule();
            match arguments.get(name) {
                Some(Value::Null) if !rule.required && rule.kind != ParamKind::Any => {
                    if let Some(default) = &rule.default {
                        values.insert(name.clone(), default.clone());
                    }
                }
                Some(value) => match compiled.check(name, value) {
                    Ok(normalized) => {
                        values.insert(name.clone(), normalized);
                    }
                    Err(err) => errors.push(err),
                },
                None if rule.required => {
                    errors.push(ValidationError::new(
                        name.as_str(),
                        "required",
                        "missing required parameter",
                    ));
                }
                None => {
                    if let Some(default) = &rule.default {
                        values.insert(name.clone(), default.clone());
                    }
                }
            }
        }

        for key in arguments.keys().filter(|k| !self.rules.contains_key(*k)) {
            debug!("Dropping undeclared argument '{}'", key);
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(ToolParams {
            values,
            declared: self.rules.keys().cloned().collect(),
        })
    }
}

// ============================================================================
// Validated parameters
// ============================================================================

/// Arguments that passed schema validation, handed to a tool routine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolParams {
    values: JsonObject,
    declared: BTreeSet<String>,
}

impl ToolParams {
    /// Read a parameter that is always present after validation
    /// (required, or optional with a default).
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ToolError> {
        self.get_opt(name)?.ok_or_else(|| {
            ToolError::internal(format!("parameter '{}' was not provided", name))
        })
    }

    /// Read an optional parameter.
    pub fn get_opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ToolError> {
        if !self.declared.contains(name) {
            return Err(ToolError::internal(format!(
                "parameter '{}' is not declared in the tool schema",
                name
            )));
        }
        self.values
            .get(name)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    ToolError::internal(format!("parameter '{}' has unexpected shape: {}", name, e))
                })
            })
            .transpose()
    }

    /// Deserialize all validated parameters into a typed struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|e| ToolError::internal(format!("failed to parse parameters: {}", e)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn as_map(&self) -> &JsonObject {
        &self.values
    }

    pub fn into_map(self) -> JsonObject {
        self.values
    }
}
