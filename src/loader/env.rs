//! Environment variable loading

use super::Loader;
use crate::normalize::align_keys;
use crate::schema::Schema;
use anyhow::{Context, Result};
use async_trait::async_trait;
use figment::providers::Env;
use figment::Figment;
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_SEPARATOR: &str = "__";

/// Maps `PREFIX_A__B=value` into `{"a": {"b": value}}`.
///
/// Backed by figment's `Env` provider: the prefix is stripped, keys are
/// lowercased and values are parsed the way figment parses them (so `3000`
/// arrives as a number and `true` as a boolean). Give it a [`Schema`] to map
/// lowercased keys back onto camelCase field names before merging.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    name: String,
    prefix: String,
    separator: String,
    schema: Option<Arc<Schema>>,
}

impl EnvLoader {
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            name: format!("env({prefix}*)"),
            prefix,
            separator: DEFAULT_SEPARATOR.to_string(),
            schema: None,
        }
    }

    pub fn split(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Rename keys to the spelling `schema` declares (`expirein` → `expireIn`).
    pub fn schema(mut self, schema: impl Into<Arc<Schema>>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

#[async_trait]
impl Loader for EnvLoader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Value> {
        let mut value = Figment::from(Env::prefixed(&self.prefix).split(self.separator.clone()))
            .extract::<Value>()
            .with_context(|| format!("Failed to extract {}* environment variables", self.prefix))?;
        if let (Some(schema), Value::Object(map)) = (&self.schema, &mut value) {
            align_keys(&schema.fields, map);
        }
        Ok(value)
    }
}
