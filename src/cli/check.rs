//! Check command implementation

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use typed_config::loader::file::DEFAULT_BASENAME;
use typed_config::{
    coerce_with_schema, resolve, ConfigError, EnvLoader, ErrorNode, FileLoader, Load, Schema,
    Source, TypedConfigOptions, ValidationOptions,
};

#[derive(Args)]
pub struct CheckArgs {
    /// Schema file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Directory to start searching for a config file from
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub search_from: PathBuf,

    /// Config file name to search for, without extension
    #[arg(long, value_name = "NAME", default_value = DEFAULT_BASENAME)]
    pub basename: String,

    /// Read this config file instead of searching
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Merge environment variables with this prefix over the file (e.g. APP_)
    #[arg(long, value_name = "PREFIX")]
    pub env_prefix: Option<String>,

    /// Separator between nesting levels in environment variable names
    #[arg(long, value_name = "SEP", default_value = "__")]
    pub env_separator: String,

    /// Accept keys the schema does not declare (they are dropped)
    #[arg(long)]
    pub allow_unknown: bool,

    /// Do not fill missing fields from schema defaults
    #[arg(long)]
    pub no_defaults: bool,

    /// Coerce values to the scalar types the schema declares
    #[arg(long)]
    pub coerce: bool,
}

pub async fn run(args: CheckArgs) -> Result<()> {
    let schema = Arc::new(
        Schema::from_file(&args.schema)
            .with_context(|| format!("Failed loading schema: {}", args.schema.display()))?,
    );

    // An explicit --config must load; a discovered file may be absent when
    // the environment supplies everything.
    let file_source = match &args.config {
        Some(path) => Source::required(FileLoader::file(path)),
        None => Source::optional(FileLoader::new(&args.search_from).basename(&args.basename)),
    };
    let load = match &args.env_prefix {
        Some(prefix) => Load::chain([
            file_source,
            Source::optional(
                EnvLoader::prefixed(prefix).split(&args.env_separator).schema(schema.clone()),
            ),
        ]),
        None => Load::Single(file_source.loader),
    };

    let mut options = TypedConfigOptions::new(schema.clone(), load).validation_options(
        ValidationOptions {
            forbid_unknown_fields: !args.allow_unknown,
            apply_defaults: !args.no_defaults,
            ..ValidationOptions::default()
        },
    );
    if args.coerce {
        options = options.normalize(coerce_with_schema(schema));
    }

    match resolve(&options).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(ConfigError::Validation { report, errors }) => {
            eprintln!("{}", style(report.trim_end()).red().for_stderr());
            let total: usize = errors.iter().map(ErrorNode::count).sum();
            anyhow::bail!("Configuration check failed with {} violation(s)", total)
        }
        Err(e) => Err(e.into()),
    }
}
