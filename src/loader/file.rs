//! Config file discovery and loading

use super::Loader;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASENAME: &str = ".env";

const EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

/// Loads the first `<basename>.{toml,yaml,yml,json}` found in `search_from` or
/// one of its ancestors.
#[derive(Debug, Clone)]
pub struct FileLoader {
    name: String,
    search_from: PathBuf,
    basename: String,
    explicit: Option<PathBuf>,
    stop_at: Option<PathBuf>,
}

impl FileLoader {
    pub fn new(search_from: impl Into<PathBuf>) -> Self {
        let search_from = search_from.into();
        Self {
            name: format!("file({})", search_from.display()),
            search_from,
            basename: DEFAULT_BASENAME.to_string(),
            explicit: None,
            stop_at: None,
        }
    }

    /// Skip discovery and read exactly this file. A missing file is an error.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut loader = Self::new(path.parent().unwrap_or(Path::new(".")));
        loader.name = format!("file({})", path.display());
        loader.explicit = Some(path);
        loader
    }

    pub fn basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = basename.into();
        self
    }

    /// Do not search above this directory.
    pub fn stop_at(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stop_at = Some(dir.into());
        self
    }

    /// Walk up from `search_from` and return the first matching file.
    pub async fn discover(&self) -> Option<PathBuf> {
        let start = canonical(&self.search_from).await;
        let stop_at = match &self.stop_at {
            Some(dir) => Some(canonical(dir).await),
            None => None,
        };

        for dir in start.ancestors() {
            for ext in EXTENSIONS {
                let candidate = dir.join(format!("{}.{}", self.basename, ext));
                if is_file(&candidate).await {
                    return Some(candidate);
                }
            }
            if stop_at.as_deref() == Some(dir) {
                break;
            }
        }

        None
    }
}

async fn canonical(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path).await.unwrap_or_else(|_| path.to_path_buf())
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

#[async_trait]
impl Loader for FileLoader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Value> {
        let path = match &self.explicit {
            Some(path) => path.clone(),
            None => self.discover().await.ok_or_else(|| {
                anyhow!(
                    "No {}.{{{}}} file found from {}",
                    self.basename,
                    EXTENSIONS.join(","),
                    self.search_from.display()
                )
            })?,
        };
        tracing::debug!("Loading config file {}", path.display());

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed reading config file: {}", path.display()))?;
        parse_config(&content, &path)
    }
}

/// Parse file content into a raw value, picking the format from the extension.
pub fn parse_config(content: &str, path: &Path) -> Result<Value> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    match ext.as_str() {
        "toml" => {
            let raw: toml::Value = toml::from_str(content)
                .with_context(|| format!("Invalid TOML syntax: {}", path.display()))?;
            serde_json::to_value(raw)
                .with_context(|| format!("Invalid TOML config: {}", path.display()))
        }
        "yaml" | "yml" => serde_yaml::from_str(content)
            .with_context(|| format!("Invalid YAML syntax: {}", path.display())),
        "json" => serde_json::from_str(content)
            .with_context(|| format!("Invalid JSON syntax: {}", path.display())),
        other => {
            anyhow::bail!("Unsupported config extension '.{}' for file {}", other, path.display())
        }
    }
}
