//! typed-config: load, merge, normalize and validate application configuration
//!
//! Configuration is read from one or more [`Loader`]s, deep-merged in source
//! order, passed through an optional normalizer and checked against a
//! data-described [`Schema`]. The result is either a typed value or a single
//! report listing every violation by dotted path.

pub mod error;
pub mod loader;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod validate;

/// Untyped configuration mapping, as produced by loaders and merged.
pub type RawConfig = serde_json::Map<String, serde_json::Value>;

pub use error::{ConfigError, Result};
pub use loader::{AsyncFnLoader, EnvLoader, FileLoader, FnLoader, Load, Loader, Source, StaticLoader};
pub use merge::{deep_merge, load_raw, CollectingSink, DiagnosticSink, LoaderFailure, TracingSink};
pub use normalize::{align_keys, coerce_with_schema, Normalizer};
pub use pipeline::{define_config, resolve, TypedConfigOptions, Validator};
pub use report::{flatten, format_report};
pub use schema::{Constraint, Field, FieldType, Pattern, Schema};
pub use validate::{validate, validate_config, ErrorNode, ValidationOptions, Violation};
