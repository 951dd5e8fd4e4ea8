//! End-to-end tests for the configuration pipeline

use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use typed_config::{
    coerce_with_schema, define_config, resolve, CollectingSink, ConfigError, Constraint, Field, FileLoader, FnLoader,
    Load, Schema, Source, StaticLoader, TypedConfigOptions,
};

#[derive(Debug, Deserialize, PartialEq)]
struct ServerConfig {
    port: f64,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct JwtConfig {
    secret: String,
    expire_in: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct AppConfig {
    server: ServerConfig,
    jwt: JwtConfig,
}

fn app_schema() -> Schema {
    Schema::new()
        .field(Field::object("server", Schema::new().field(Field::number("port"))))
        .field(Field::object(
            "jwt",
            Schema::new().field(Field::string("secret")).field(Field::string("expireIn")),
        ))
}

fn inline(value: Value) -> Load {
    Load::single(StaticLoader::new("inline", value))
}

fn report_of(err: &ConfigError) -> &str {
    match err {
        ConfigError::Validation { report, .. } => report,
        other => panic!("expected validation failure, got {other}"),
    }
}

#[tokio::test]
async fn test_round_trip_success() {
    let input = json!({"server": {"port": 3000}, "jwt": {"secret": "secret", "expireIn": "30d"}});
    let options = TypedConfigOptions::new(app_schema(), inline(input.clone()));
    assert_eq!(resolve(&options).await.expect("valid"), input);

    let config: AppConfig = define_config(options).await.expect("typed");
    assert_eq!(
        config,
        AppConfig {
            server: ServerConfig { port: 3000.0 },
            jwt: JwtConfig { secret: "secret".to_string(), expire_in: "30d".to_string() },
        }
    );
}

#[tokio::test]
async fn test_merge_precedence_across_loaders() {
    let schema = Schema::new().field(Field::any("a"));
    let options = TypedConfigOptions::new(
        schema,
        Load::chain([
            Source::optional(StaticLoader::new("l1", json!({"a": {"x": 1}}))),
            Source::optional(StaticLoader::new("l2", json!({"a": {"x": 2, "y": 3}}))),
        ]),
    );
    assert_eq!(resolve(&options).await.expect("valid"), json!({"a": {"x": 2, "y": 3}}));
}

#[tokio::test]
async fn test_loader_fault_tolerance() {
    let sink = Arc::new(CollectingSink::default());
    let options = TypedConfigOptions::new(
        Schema::new().field(Field::integer("a")),
        Load::chain([
            Source::optional(FnLoader::new("l1", || anyhow::bail!("file not found"))),
            Source::optional(StaticLoader::new("l2", json!({"a": 1}))),
        ]),
    )
    .diagnostics(sink.clone());

    assert_eq!(resolve(&options).await.expect("valid"), json!({"a": 1}));
    let failures = sink.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].loader, "l1");
    assert_eq!(failures[0].message, "file not found");
}

#[tokio::test]
async fn test_shape_rejection() {
    let options = TypedConfigOptions::new(app_schema(), inline(json!(42)));
    let err = resolve(&options).await.expect_err("shape");
    assert!(matches!(err, ConfigError::Shape { .. }));
    assert!(err.to_string().contains("Configuration should be an object, received: 42"));
}

#[tokio::test]
async fn test_defaulting() {
    let schema = Schema::new().field(Field::integer("port").default_value(8080));
    let options = TypedConfigOptions::new(schema, inline(json!({})));
    assert_eq!(resolve(&options).await.expect("valid"), json!({"port": 8080}));
}

#[tokio::test]
async fn test_required_field_violation_path() {
    let options = TypedConfigOptions::new(
        app_schema(),
        inline(json!({"server": {"port": 1}, "jwt": {"expireIn": "30d"}})),
    );
    let err = resolve(&options).await.expect_err("invalid");
    assert!(report_of(&err).contains("config jwt.secret does not match the following rules"));
}

#[tokio::test]
async fn test_unknown_field_rejection() {
    let options = TypedConfigOptions::new(
        app_schema(),
        inline(json!({"server": {"port": 1}, "jwt": {"secret": "s", "expireIn": "1d"}, "foo": true})),
    );
    let err = resolve(&options).await.expect_err("invalid");
    let report = report_of(&err);
    assert!(report.contains("config foo does not match"));
    assert!(report.contains("unknown_field"));
}

#[tokio::test]
async fn test_exhaustive_reporting() {
    let schema = app_schema().field(
        Field::string("mode").constraint(Constraint::OneOf(vec![json!("dev"), json!("prod")])),
    );
    let options = TypedConfigOptions::new(
        schema,
        inline(json!({
            "server": {"port": "not-a-number"},
            "jwt": {"secret": "s", "expireIn": "1d"},
            "mode": "staging"
        })),
    );
    let err = resolve(&options).await.expect_err("invalid");
    let report = report_of(&err);
    assert!(report.contains("config server.port does not match"));
    assert!(report.contains("config mode does not match"));
    assert_eq!(err.violations().map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn test_file_loader_end_to_end() {
    let tmp = TempDir::new().expect("tmp");
    fs::write(
        tmp.path().join(".env.toml"),
        "[server]\nport = 3000\n\n[jwt]\nsecret = \"secret\"\nexpireIn = \"30d\"\n",
    )
    .expect("write");

    let config: AppConfig = define_config(TypedConfigOptions::new(
        app_schema(),
        Load::single(FileLoader::new(tmp.path())),
    ))
    .await
    .expect("typed");
    assert_eq!(config.jwt.expire_in, "30d");
    assert_eq!(config.server.port, 3000.0);
}

#[tokio::test]
async fn test_schema_shared_between_runs() {
    let schema = Arc::new(Schema::new().field(Field::string("name").default_value("app")));
    let runs: Vec<_> = (0..4)
        .map(|i| {
            let options =
                TypedConfigOptions::new(schema.clone(), inline(json!({"name": format!("app-{i}")})));
            tokio::spawn(async move { resolve(&options).await.map(|v| v["name"].clone()) })
        })
        .collect();
    for (i, run) in runs.into_iter().enumerate() {
        let name = run.await.expect("join").expect("valid");
        assert_eq!(name, json!(format!("app-{i}")));
    }
}

#[tokio::test]
async fn test_coercion_restores_env_style_values() {
    let schema = Arc::new(app_schema());
    let options = TypedConfigOptions::new(
        schema.clone(),
        inline(json!({"server": {"port": "3000"}, "jwt": {"secret": 12345, "expirein": "30d"}})),
    )
    .normalize(coerce_with_schema(schema));

    let config: AppConfig = define_config(options).await.expect("typed");
    assert_eq!(config.jwt.secret, "12345");
    assert_eq!(config.jwt.expire_in, "30d");
    assert_eq!(config.server.port, 3000.0);
}
