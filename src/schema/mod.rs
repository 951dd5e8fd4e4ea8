//! Declarative configuration schema
//!
//! A schema is plain data: an ordered list of field descriptors, each with a
//! type tag, a required flag, an optional default and a list of constraints.
//! Object fields nest further descriptors. Schemas are built in code with the
//! builder methods below, or read from a TOML/YAML/JSON file.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub mod constraint;

pub use constraint::{Constraint, Pattern};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub ty: FieldType,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    /// Accepts any value without a type check.
    Any,
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<FieldType>>,
    },
    Object {
        #[serde(default)]
        fields: Vec<Field>,
    },
}

impl FieldType {
    /// Type-check constraint name and message for a mismatching value, or
    /// `None` when the value has this type.
    pub fn mismatch(&self, field: &str, value: &Value) -> Option<(&'static str, String)> {
        let (ok, name, expected) = match self {
            FieldType::String => (value.is_string(), "is_string", "a string"),
            FieldType::Number => (value.is_number(), "is_number", "a number"),
            FieldType::Integer => {
                (value.is_i64() || value.is_u64(), "is_integer", "an integer number")
            }
            FieldType::Boolean => (value.is_boolean(), "is_boolean", "a boolean value"),
            FieldType::Any => (true, "", ""),
            FieldType::Array { .. } => (value.is_array(), "is_array", "an array"),
            FieldType::Object { .. } => (value.is_object(), "is_object", "an object"),
        };
        (!ok).then(|| (name, format!("{field} must be {expected}")))
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Read a schema file, picking the format from its extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let schema_err = |message: String| ConfigError::Schema {
            path: path.display().to_string(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| schema_err(e.to_string()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "toml" => toml::from_str(&content).map_err(|e| schema_err(e.to_string())),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| schema_err(e.to_string())),
            "json" => serde_json::from_str(&content).map_err(|e| schema_err(e.to_string())),
            other => Err(schema_err(format!("unsupported schema extension '.{other}'"))),
        }
    }
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self { name: name.into(), ty, required: true, default: None, constraints: Vec::new() }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Any)
    }

    pub fn array(name: impl Into<String>, items: Option<FieldType>) -> Self {
        Self::new(name, FieldType::Array { items: items.map(Box::new) })
    }

    pub fn object(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, FieldType::Object { fields: schema.fields })
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Nested field descriptors for object fields.
    pub fn nested(&self) -> Option<&[Field]> {
        match &self.ty {
            FieldType::Object { fields } => Some(fields),
            _ => None,
        }
    }
}
