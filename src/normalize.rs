//! Pre-validation transforms

use crate::schema::{Field, FieldType, Schema};
use crate::RawConfig;
use serde_json::{Number, Value};
use std::sync::Arc;

/// Runs once between merge and validation. An error aborts the pipeline.
pub type Normalizer = Box<dyn Fn(RawConfig) -> anyhow::Result<RawConfig> + Send + Sync>;

pub fn identity(raw: RawConfig) -> RawConfig {
    raw
}

/// Coerce leaves to the scalar type the schema declares for them.
///
/// Sources such as environment variables lose the declared types; this turns
/// `"3000"` into `3000` for number fields, `"true"` into `true` for booleans,
/// `"a, b"` into `["a", "b"]` for arrays and `12345` back into `"12345"` for
/// string fields. Values that do not parse are left alone for the validator
/// to reject.
///
/// Keys that match a declared field only up to ASCII case (`expirein` for
/// `expireIn`) are moved under the declared spelling first.
pub fn coerce_with_schema(schema: Arc<Schema>) -> Normalizer {
    Box::new(move |mut raw| {
        coerce_object(&schema.fields, &mut raw);
        Ok(raw)
    })
}

/// Rename keys that differ from a declared field name only in ASCII case,
/// recursing into nested objects. An exact match is never replaced.
pub fn align_keys(fields: &[Field], map: &mut RawConfig) {
    for field in fields {
        adopt_declared_spelling(&field.name, map);
        let Some(nested) = field.nested() else { continue };
        if let Some(Value::Object(inner)) = map.get_mut(&field.name) {
            align_keys(nested, inner);
        }
    }
}

fn adopt_declared_spelling(name: &str, map: &mut RawConfig) {
    if map.contains_key(name) {
        return;
    }
    let Some(key) = map.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned() else {
        return;
    };
    if let Some(value) = map.remove(&key) {
        map.insert(name.to_string(), value);
    }
}

fn coerce_object(fields: &[Field], map: &mut RawConfig) {
    for field in fields {
        adopt_declared_spelling(&field.name, map);
        if let Some(value) = map.get_mut(&field.name) {
            coerce_value(&field.ty, value);
        }
    }
}

fn coerce_value(ty: &FieldType, value: &mut Value) {
    match (ty, &mut *value) {
        (FieldType::Object { fields }, Value::Object(map)) => coerce_object(fields, map),
        (FieldType::Array { items }, Value::String(s)) => {
            let mut elements: Vec<Value> = parse_csv(s).into_iter().map(Value::String).collect();
            if let Some(items) = items {
                elements.iter_mut().for_each(|e| coerce_value(items, e));
            }
            *value = Value::Array(elements);
        }
        (FieldType::Array { items: Some(items) }, Value::Array(elements)) => {
            elements.iter_mut().for_each(|e| coerce_value(items, e));
        }
        (FieldType::Integer, Value::String(s)) => {
            if let Ok(n) = s.trim().parse::<i64>() {
                *value = Value::from(n);
            }
        }
        (FieldType::Number, Value::String(s)) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                *value = Value::from(n);
            } else if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
                *value = Value::Number(n);
            }
        }
        (FieldType::String, Value::Number(n)) => *value = Value::String(n.to_string()),
        (FieldType::String, Value::Bool(b)) => *value = Value::String(b.to_string()),
        (FieldType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => *value = Value::Bool(true),
            "false" => *value = Value::Bool(false),
            _ => {}
        },
        _ => {}
    }
}

/// Split a comma-separated string, trimming whitespace and dropping empty
/// segments.
fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}
