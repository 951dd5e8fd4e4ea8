//! The load → merge → normalize → validate pipeline.

use crate::error::{ConfigError, Result};
use crate::loader::Load;
use crate::merge::{load_raw, DiagnosticSink, TracingSink};
use crate::normalize::{self, Normalizer};
use crate::schema::Schema;
use crate::validate::{validate_config, ValidationOptions};
use crate::RawConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Replaces the schema validator entirely.
pub type Validator =
    Box<dyn Fn(RawConfig, &Schema, &ValidationOptions) -> anyhow::Result<Value> + Send + Sync>;

pub struct TypedConfigOptions {
    pub schema: Arc<Schema>,
    pub load: Load,
    pub normalize: Option<Normalizer>,
    pub validate: Option<Validator>,
    pub validation_options: ValidationOptions,
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

impl TypedConfigOptions {
    pub fn new(schema: impl Into<Arc<Schema>>, load: Load) -> Self {
        Self {
            schema: schema.into(),
            load,
            normalize: None,
            validate: None,
            validation_options: ValidationOptions::default(),
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn normalize(
        mut self,
        f: impl Fn(RawConfig) -> anyhow::Result<RawConfig> + Send + Sync + 'static,
    ) -> Self {
        self.normalize = Some(Box::new(f));
        self
    }

    pub fn validate(
        mut self,
        f: impl Fn(RawConfig, &Schema, &ValidationOptions) -> anyhow::Result<Value>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.validate = Some(Box::new(f));
        self
    }

    pub fn validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation_options = options;
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }
}

/// Load, merge, normalize and validate configuration, then deserialize it into
/// `T`.
///
/// ```no_run
/// use serde::Deserialize;
/// use typed_config::{define_config, Field, FileLoader, Load, Schema, TypedConfigOptions};
///
/// #[derive(Deserialize)]
/// struct Server {
///     port: u16,
/// }
///
/// #[derive(Deserialize)]
/// struct AppConfig {
///     server: Server,
/// }
///
/// # async fn run() -> typed_config::Result<()> {
/// let schema = Schema::new().field(Field::object(
///     "server",
///     Schema::new().field(Field::integer("port").default_value(8080)),
/// ));
/// let config: AppConfig =
///     define_config(TypedConfigOptions::new(schema, Load::single(FileLoader::new(".")))).await?;
/// println!("listening on {}", config.server.port);
/// # Ok(())
/// # }
/// ```
pub async fn define_config<T: DeserializeOwned>(options: TypedConfigOptions) -> Result<T> {
    let value = resolve(&options).await?;
    Ok(serde_json::from_value(value)?)
}

/// Run the pipeline up to the validated, untyped value.
pub async fn resolve(options: &TypedConfigOptions) -> Result<Value> {
    let raw = load_raw(&options.load, options.diagnostics.as_ref()).await?;
    tracing::debug!("Merged {} top-level config key(s)", raw.len());

    let normalized = match &options.normalize {
        Some(f) => f(raw).map_err(ConfigError::Normalize)?,
        None => normalize::identity(raw),
    };

    match &options.validate {
        Some(f) => f(normalized, &options.schema, &options.validation_options)
            .map_err(ConfigError::Validator),
        None => validate_config(&options.schema, normalized, &options.validation_options),
    }
}
