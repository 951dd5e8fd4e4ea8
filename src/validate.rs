//! Schema validation
//!
//! Walks a [`Schema`] against a normalized raw mapping, instantiating the
//! target shape (declared values plus defaults) and collecting every violation
//! into a tree of [`ErrorNode`]s that mirrors the schema nesting. Nothing is
//! short-circuited: one pass yields the complete report.

use crate::error::{ConfigError, Result};
use crate::report::format_report;
use crate::schema::{Constraint, Field, FieldType, Schema};
use crate::RawConfig;
use serde::Serialize;
use serde_json::{Map, Value};

/// Strictness knobs for the schema validator. Defaults to the strictest rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report keys missing from the schema as `unknown_field` violations.
    pub forbid_unknown_fields: bool,
    /// When unknown keys are allowed, drop them from the result instead of
    /// passing them through.
    pub strip_unknown_fields: bool,
    /// Fill absent fields from their declared default before checking.
    pub apply_defaults: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self { forbid_unknown_fields: true, strip_unknown_fields: true, apply_defaults: true }
    }
}

/// One failed constraint on one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub constraint: String,
    pub message: String,
    /// Offending value; `None` when the field was missing.
    pub value: Option<Value>,
}

impl Violation {
    fn new(constraint: &str, message: String, value: Option<&Value>) -> Self {
        Self { constraint: constraint.to_string(), message, value: value.cloned() }
    }
}

/// Violations for one field plus those of its nested fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorNode {
    pub field: String,
    pub violations: Vec<Violation>,
    pub children: Vec<ErrorNode>,
}

impl ErrorNode {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into(), ..Self::default() }
    }

    pub fn has_errors(&self) -> bool {
        !self.violations.is_empty() || self.children.iter().any(ErrorNode::has_errors)
    }

    /// Total violations in this subtree.
    pub fn count(&self) -> usize {
        self.violations.len() + self.children.iter().map(ErrorNode::count).sum::<usize>()
    }
}

/// Validate `raw` against `schema`, returning the instantiated value or the
/// full violation forest.
pub fn validate(
    schema: &Schema,
    raw: RawConfig,
    options: &ValidationOptions,
) -> std::result::Result<Value, Vec<ErrorNode>> {
    let mut errors = Vec::new();
    let instantiated = validate_object(&schema.fields, raw, options, &mut errors);
    if errors.is_empty() {
        Ok(Value::Object(instantiated))
    } else {
        Err(errors)
    }
}

/// Like [`validate`], but folds failures into [`ConfigError::Validation`]
/// carrying the formatted report.
pub fn validate_config(
    schema: &Schema,
    raw: RawConfig,
    options: &ValidationOptions,
) -> Result<Value> {
    validate(schema, raw, options).map_err(|errors| {
        let total: usize = errors.iter().map(ErrorNode::count).sum();
        tracing::debug!("Configuration failed validation with {} violation(s)", total);
        ConfigError::Validation { report: format_report(&errors), errors }
    })
}

fn validate_object(
    fields: &[Field],
    mut raw: Map<String, Value>,
    options: &ValidationOptions,
    errors: &mut Vec<ErrorNode>,
) -> Map<String, Value> {
    let mut out = Map::new();

    for field in fields {
        // `null` counts as absent, so it can be defaulted or rejected as missing.
        let value = raw.remove(&field.name).filter(|v| !v.is_null()).or_else(|| {
            if options.apply_defaults {
                field.default.clone()
            } else {
                None
            }
        });

        let mut node = ErrorNode::new(&field.name);
        match value {
            Some(value) => {
                let instantiated = validate_value(
                    &field.name,
                    &field.ty,
                    &field.constraints,
                    value,
                    options,
                    &mut node,
                );
                out.insert(field.name.clone(), instantiated);
            }
            None if field.required => node.violations.push(Violation::new(
                "required",
                format!("{} should not be missing", field.name),
                None,
            )),
            None => {}
        }

        if node.has_errors() {
            errors.push(node);
        }
    }

    // Whatever is left in `raw` was not declared.
    for (key, value) in raw {
        if options.forbid_unknown_fields {
            let mut node = ErrorNode::new(&key);
            node.violations.push(Violation::new(
                "unknown_field",
                format!("property {key} should not exist"),
                Some(&value),
            ));
            errors.push(node);
        } else if !options.strip_unknown_fields {
            out.insert(key, value);
        }
    }

    out
}

fn validate_value(
    label: &str,
    ty: &FieldType,
    constraints: &[Constraint],
    value: Value,
    options: &ValidationOptions,
    node: &mut ErrorNode,
) -> Value {
    if let Some((name, message)) = ty.mismatch(label, &value) {
        node.violations.push(Violation::new(name, message, Some(&value)));
    }

    let instantiated = match (ty, value) {
        (FieldType::Object { fields }, Value::Object(map)) => {
            Value::Object(validate_object(fields, map, options, &mut node.children))
        }
        (FieldType::Array { items: Some(items) }, Value::Array(elements)) => {
            let element_label = format!("each value in {label}");
            let instantiated = elements
                .into_iter()
                .enumerate()
                .map(|(idx, element)| {
                    let mut child = ErrorNode::new(idx.to_string());
                    let v = validate_value(&element_label, items, &[], element, options, &mut child);
                    if child.has_errors() {
                        node.children.push(child);
                    }
                    v
                })
                .collect();
            Value::Array(instantiated)
        }
        (_, value) => value,
    };

    for constraint in constraints {
        if let Some(message) = constraint.check(label, &instantiated) {
            node.violations.push(Violation::new(constraint.name(), message, Some(&instantiated)));
        }
    }

    instantiated
}
