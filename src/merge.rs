//! Loader orchestration and deep merging
//!
//! Loaders in a chain run strictly one after another, in declared order, and
//! their outputs are deep-merged so later sources win on leaf conflicts.
//! Failures of optional sources are reported to a [`DiagnosticSink`] and
//! skipped.

use crate::error::{ConfigError, Result};
use crate::loader::{Load, Loader};
use crate::RawConfig;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

/// Receives non-fatal loader failures.
pub trait DiagnosticSink: Send + Sync {
    fn loader_failed(&self, loader: &str, error: &anyhow::Error);
}

/// Logs loader failures as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn loader_failed(&self, loader: &str, error: &anyhow::Error) {
        tracing::warn!("Config load failed for {}: {:#}", loader, error);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderFailure {
    pub loader: String,
    pub message: String,
}

/// Records loader failures for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    failures: Mutex<Vec<LoaderFailure>>,
}

impl CollectingSink {
    pub fn failures(&self) -> Vec<LoaderFailure> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl DiagnosticSink for CollectingSink {
    fn loader_failed(&self, loader: &str, error: &anyhow::Error) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LoaderFailure { loader: loader.to_string(), message: format!("{error:#}") });
    }
}

/// Merge `source` into `target`. Mappings merge key by key; every other value
/// (scalars, arrays, null) replaces what was there.
pub fn deep_merge(target: &mut RawConfig, source: RawConfig) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Run the configured loader(s) and produce one raw mapping.
pub async fn load_raw(load: &Load, sink: &dyn DiagnosticSink) -> Result<RawConfig> {
    match load {
        Load::Single(loader) => {
            let value = run_loader(loader.as_ref()).await.map_err(|source| ConfigError::Load {
                loader: loader.name().to_string(),
                source,
            })?;
            into_mapping(loader.name(), value)
        }
        Load::Chain(sources) => {
            let mut merged = RawConfig::new();
            for source in sources {
                let name = source.loader.name();
                match run_loader(source.loader.as_ref()).await {
                    Ok(value) => deep_merge(&mut merged, into_mapping(name, value)?),
                    Err(error) if source.required => {
                        return Err(ConfigError::Load { loader: name.to_string(), source: error });
                    }
                    Err(error) => sink.loader_failed(name, &error),
                }
            }
            Ok(merged)
        }
    }
}

async fn run_loader(loader: &dyn Loader) -> anyhow::Result<Value> {
    tracing::debug!("Running config loader {}", loader.name());
    loader.load().await
}

fn into_mapping(loader: &str, value: Value) -> Result<RawConfig> {
    match value {
        Value::Object(map) => Ok(map),
        other => {
            tracing::debug!("Loader {} returned a non-mapping value", loader);
            Err(ConfigError::Shape { received: other.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{AsyncFnLoader, FnLoader, Source, StaticLoader};
    use serde_json::json;
    use std::time::Duration;

    fn map(value: Value) -> RawConfig {
        value.as_object().cloned().expect("object")
    }

    fn failing(name: &str) -> FnLoader<impl Fn() -> anyhow::Result<Value> + Send + Sync> {
        FnLoader::new(name, || Err(anyhow::anyhow!("source unavailable")))
    }

    #[test]
    fn test_deep_merge_last_writer_wins_on_leaves() {
        let mut target = map(json!({"a": {"x": 1}}));
        deep_merge(&mut target, map(json!({"a": {"x": 2, "y": 3}})));
        assert_eq!(Value::Object(target), json!({"a": {"x": 2, "y": 3}}));
    }

    #[test]
    fn test_deep_merge_replaces_arrays_and_scalars() {
        let mut target = map(json!({"list": [1, 2, 3], "a": {"b": 1}, "s": "x"}));
        deep_merge(&mut target, map(json!({"list": [9], "a": 5, "s": {"nested": true}})));
        assert_eq!(Value::Object(target), json!({"list": [9], "a": 5, "s": {"nested": true}}));
    }

    #[tokio::test]
    async fn test_chain_merges_in_order() {
        let load = Load::chain([
            Source::optional(StaticLoader::new("l1", json!({"a": {"x": 1}}))),
            Source::optional(StaticLoader::new("l2", json!({"a": {"x": 2, "y": 3}}))),
        ]);
        let merged = load_raw(&load, &TracingSink).await.expect("merge");
        assert_eq!(Value::Object(merged), json!({"a": {"x": 2, "y": 3}}));
    }

    #[tokio::test]
    async fn test_order_is_source_order_not_completion_order() {
        let load = Load::chain([
            Source::optional(AsyncFnLoader::new("slow", || async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(json!({"winner": "slow"}))
            })),
            Source::optional(StaticLoader::new("fast", json!({"winner": "fast"}))),
        ]);
        let merged = load_raw(&load, &TracingSink).await.expect("merge");
        assert_eq!(merged["winner"], json!("fast"));
    }

    #[tokio::test]
    async fn test_failing_loader_is_skipped_and_reported() {
        let sink = CollectingSink::default();
        let load = Load::chain([
            Source::optional(failing("broken")),
            Source::optional(StaticLoader::new("ok", json!({"a": 1}))),
        ]);
        let merged = load_raw(&load, &sink).await.expect("merge");
        assert_eq!(Value::Object(merged), json!({"a": 1}));
        assert_eq!(
            sink.failures(),
            vec![LoaderFailure {
                loader: "broken".to_string(),
                message: "source unavailable".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_all_loaders_failing_yields_empty_mapping() {
        let sink = CollectingSink::default();
        let load = Load::chain([Source::optional(failing("a")), Source::optional(failing("b"))]);
        let merged = load_raw(&load, &sink).await.expect("merge");
        assert!(merged.is_empty());
        assert_eq!(sink.failures().len(), 2);
    }

    #[tokio::test]
    async fn test_required_source_failure_is_fatal() {
        let load = Load::chain([
            Source::optional(StaticLoader::new("defaults", json!({"a": 1}))),
            Source::required(failing("primary")),
        ]);
        let err = load_raw(&load, &TracingSink).await.expect_err("fatal");
        assert!(matches!(err, ConfigError::Load { ref loader, .. } if loader == "primary"));
    }

    #[tokio::test]
    async fn test_single_loader_failure_is_fatal() {
        let err = load_raw(&Load::single(failing("only")), &TracingSink).await.expect_err("fatal");
        assert!(err.to_string().contains("source unavailable"));
    }

    #[tokio::test]
    async fn test_non_mapping_is_shape_error() {
        let err = load_raw(&Load::single(StaticLoader::new("num", json!(42))), &TracingSink)
            .await
            .expect_err("shape");
        assert!(matches!(err, ConfigError::Shape { ref received } if received == "42"));

        let chained = Load::chain([Source::optional(StaticLoader::new("list", json!([1])))]);
        let err = load_raw(&chained, &TracingSink).await.expect_err("shape");
        assert!(matches!(err, ConfigError::Shape { .. }));
    }
}
