//! Configuration sources
//!
//! A [`Loader`] produces a raw configuration value, possibly asynchronously,
//! possibly failing. The pipeline accepts either a single loader or an ordered
//! chain of [`Source`]s, see [`Load`].

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::future::Future;

pub mod env;
pub mod file;

pub use env::EnvLoader;
pub use file::FileLoader;

#[async_trait]
pub trait Loader: Send + Sync {
    /// Identifies the loader in diagnostics.
    fn name(&self) -> &str;

    async fn load(&self) -> Result<Value>;
}

/// Wraps a synchronous closure.
pub struct FnLoader<F> {
    name: String,
    f: F,
}

impl<F> FnLoader<F>
where
    F: Fn() -> Result<Value> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

#[async_trait]
impl<F> Loader for FnLoader<F>
where
    F: Fn() -> Result<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Value> {
        (self.f)()
    }
}

type LoadFn = Box<dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Wraps a closure returning a future.
pub struct AsyncFnLoader {
    name: String,
    f: LoadFn,
}

impl AsyncFnLoader {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self { name: name.into(), f: Box::new(move || f().boxed()) }
    }
}

#[async_trait]
impl Loader for AsyncFnLoader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Value> {
        (self.f)().await
    }
}

/// Always yields the same value. Handy for programmatic defaults at the front
/// of a chain.
pub struct StaticLoader {
    name: String,
    value: Value,
}

impl StaticLoader {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self { name: name.into(), value }
    }
}

#[async_trait]
impl Loader for StaticLoader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Value> {
        Ok(self.value.clone())
    }
}

/// One entry of a loader chain.
pub struct Source {
    pub loader: Box<dyn Loader>,
    /// A required source aborts the pipeline when it fails instead of being
    /// skipped.
    pub required: bool,
}

impl Source {
    pub fn optional(loader: impl Loader + 'static) -> Self {
        Self { loader: Box::new(loader), required: false }
    }

    pub fn required(loader: impl Loader + 'static) -> Self {
        Self { loader: Box::new(loader), required: true }
    }
}

/// Where raw configuration comes from.
pub enum Load {
    /// A lone loader; its failure is fatal.
    Single(Box<dyn Loader>),
    /// Loaders run in order and deep-merged, later ones winning.
    Chain(Vec<Source>),
}

impl Load {
    pub fn single(loader: impl Loader + 'static) -> Self {
        Load::Single(Box::new(loader))
    }

    pub fn chain(sources: impl IntoIterator<Item = Source>) -> Self {
        Load::Chain(sources.into_iter().collect())
    }
}
