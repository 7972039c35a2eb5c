//! Argument schemas and field-by-field validation
//!
//! A schema is an ordered list of named fields, each with a primitive type
//! and a required flag. Validation turns untrusted JSON into
//! [`ValidatedArgs`] or a list of [`FieldError`]s, never both.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Primitive argument type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Boolean,
    Number,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Number => "number",
        }
    }

    /// Convert a JSON value into a typed argument, or None on type mismatch
    pub fn coerce(&self, value: &Value) -> Option<ArgValue> {
        match self {
            Self::String => value.as_str().map(|s| ArgValue::String(s.to_string())),
            Self::Integer => value.as_i64().map(ArgValue::Integer),
            Self::Boolean => value.as_bool().map(ArgValue::Boolean),
            Self::Number => value.as_f64().map(ArgValue::Number),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Ordered set of argument declarations for one tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSchema {
    fields: Vec<(String, FieldSpec)>,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required field
    pub fn required(self, name: &str, field_type: FieldType, description: &str) -> Self {
        self.field(name, field_type, true, description)
    }

    /// Declare an optional field
    pub fn optional(self, name: &str, field_type: FieldType, description: &str) -> Self {
        self.field(name, field_type, false, description)
    }

    fn field(mut self, name: &str, field_type: FieldType, required: bool, description: &str) -> Self {
        let spec = FieldSpec {
            field_type,
            required,
            description: (!description.is_empty()).then(|| description.to_string()),
        };
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = spec,
            None => self.fields.push((name.to_string(), spec)),
        }
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check untrusted input field by field. Extra fields are ignored.
    pub fn validate(&self, input: &Value) -> Result<ValidatedArgs, Vec<FieldError>> {
        let Some(object) = input.as_object() else {
            return Err(vec![FieldError::new("tool_input", FieldErrorKind::NotAnObject)]);
        };

        let mut values = BTreeMap::new();
        let mut errors = Vec::new();

        for (name, spec) in &self.fields {
            match object.get(name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        errors.push(FieldError::new(name, FieldErrorKind::Missing));
                    }
                }
                Some(value) => match spec.field_type.coerce(value) {
                    Some(arg) => {
                        values.insert(name.clone(), arg);
                    }
                    None if spec.field_type == FieldType::Integer && value.is_u64() => {
                        errors.push(FieldError::new(name, FieldErrorKind::OutOfRange))
                    }
                    None => errors.push(FieldError::new(
                        name,
                        FieldErrorKind::WrongType {
                            expected: spec.field_type,
                            found: json_kind(value),
                        },
                    )),
                },
            }
        }

        if errors.is_empty() {
            Ok(ValidatedArgs { values })
        } else {
            Err(errors)
        }
    }

    /// Render as a JSON Schema object for prompts
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, spec) in &self.fields {
            let mut prop = json!({ "type": spec.field_type.as_str() });
            if let Some(description) = &spec.description {
                prop["description"] = json!(description);
            }
            properties.insert(name.clone(), prop);
            if spec.required {
                required.push(json!(name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl From<BTreeMap<String, FieldSpec>> for ArgumentSchema {
    fn from(map: BTreeMap<String, FieldSpec>) -> Self {
        Self {
            fields: map.into_iter().collect(),
        }
    }
}

impl From<&ArgumentSchema> for BTreeMap<String, FieldSpec> {
    fn from(schema: &ArgumentSchema) -> Self {
        schema.fields.iter().cloned().collect()
    }
}

/// Name of a JSON value's kind for diagnostics
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A typed, schema-conformant argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Number(f64),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{}'", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Arguments that passed validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs {
    values: BTreeMap<String, ArgValue>,
}

impl ValidatedArgs {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            Some(ArgValue::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }

    /// Fetch a string argument the handler cannot run without
    pub fn require_str(&self, name: &str) -> eyre::Result<&str> {
        self.get_str(name)
            .ok_or_else(|| eyre::eyre!("missing string argument '{}'", name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Why a field failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    Missing,
    WrongType { expected: FieldType, found: &'static str },
    /// An integer too large for a signed 64-bit value
    OutOfRange,
    NotAnObject,
}

/// A field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.kind == FieldErrorKind::Missing
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldErrorKind::Missing => write!(f, "{} (missing)", self.field),
            FieldErrorKind::WrongType { expected, found } => {
                write!(f, "{} (expected {}, got {})", self.field, expected, found)
            }
            FieldErrorKind::OutOfRange => write!(f, "{} (integer out of range)", self.field),
            FieldErrorKind::NotAnObject => write!(f, "{} (expected object)", self.field),
        }
    }
}
