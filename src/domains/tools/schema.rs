//! Declarative parameter schemas.
//!
//! Actions declare their parameters with a type annotation string. The
//! annotation is mapped onto a closed set of [`ParamKind`]s; anything outside
//! that set cannot be described to clients and is rejected at startup.

use serde_json::{Map, Value, json};

use super::error::{DiscoveryError, ToolError};
use super::handlers::ActionParam;

/// The argument kinds a tool may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    StringList,
    Mapping,
}

impl ParamKind {
    /// Map a type annotation onto a supported kind.
    pub fn from_annotation(annotation: &str) -> Option<Self> {
        let normalized: String = annotation.chars().filter(|c| !c.is_whitespace()).collect();
        match normalized.as_str() {
            "String" | "&str" => Some(Self::String),
            "i32" | "i64" | "u32" | "u64" | "usize" => Some(Self::Integer),
            "bool" => Some(Self::Boolean),
            "Vec<String>" => Some(Self::StringList),
            "Map<String,Value>" | "serde_json::Map<String,Value>" | "HashMap<String,Value>" => {
                Some(Self::Mapping)
            }
            _ => None,
        }
    }

    /// Whether `value` is an instance of this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Mapping => value.is_object(),
        }
    }

    /// Human-readable name used in validation messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Boolean => "a boolean",
            Self::StringList => "a list of strings",
            Self::Mapping => "an object",
        }
    }

    /// JSON Schema fragment for this kind.
    pub fn json_schema(&self) -> Value {
        match self {
            Self::String => json!({ "type": "string" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::StringList => json!({ "type": "array", "items": { "type": "string" } }),
            Self::Mapping => json!({ "type": "object" }),
        }
    }
}

/// One caller-supplied parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
}

/// Ordered parameter schema of a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    fields: Vec<SchemaField>,
}

impl ParameterSchema {
    /// Infer a schema from the declared parameters of `function`.
    ///
    /// Fails with `SchemaInference` for a parameter without annotation and
    /// with `InvalidSignature` for an annotation outside the supported set.
    pub fn infer(function: &str, params: &[&ActionParam]) -> Result<Self, DiscoveryError> {
        let mut fields = Vec::with_capacity(params.len());

        for param in params {
            let annotation = param
                .annotation
                .ok_or_else(|| DiscoveryError::SchemaInference {
                    function: function.to_string(),
                    param: param.name.to_string(),
                })?;

            let kind = ParamKind::from_annotation(annotation).ok_or_else(|| {
                DiscoveryError::invalid_signature(
                    function,
                    format!(
                        "parameter '{}' has unsupported type '{}'",
                        param.name, annotation
                    ),
                )
            })?;

            if fields.iter().any(|f: &SchemaField| f.name == param.name) {
                return Err(DiscoveryError::invalid_signature(
                    function,
                    format!("parameter '{}' is declared twice", param.name),
                ));
            }

            fields.push(SchemaField {
                name: param.name.to_string(),
                kind,
                required: param.required,
            });
        }

        Ok(Self { fields })
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Whether the schema exposes a parameter called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Check caller-supplied `arguments` against the schema.
    ///
    /// A `null` value counts as absent. Arguments the schema does not name
    /// are rejected, which also keeps callers from overriding injected values.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<(), ToolError> {
        for field in &self.fields {
            match arguments.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(ToolError::invalid_arguments(format!(
                        "missing required argument '{}'",
                        field.name
                    )));
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.kind.matches(value) => {
                    return Err(ToolError::invalid_arguments(format!(
                        "argument '{}' must be {}",
                        field.name,
                        field.kind.describe()
                    )));
                }
                Some(_) => {}
            }
        }

        if let Some(unexpected) = arguments.keys().find(|key| !self.contains(key)) {
            return Err(ToolError::invalid_arguments(format!(
                "unexpected argument '{}'",
                unexpected
            )));
        }

        Ok(())
    }

    /// Render as a JSON Schema object for `tools/list`.
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.kind.json_schema()))
            .collect();
        let required: Vec<Value> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| Value::String(f.name.clone()))
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), Value::Array(required));
        schema
    }
}
