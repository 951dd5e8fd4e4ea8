//! Error types for the configuration pipeline

use crate::validate::ErrorNode;
use thiserror::Error;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A loader with no fallback (single loader, or a required source) failed.
    #[error("Config load failed for `{loader}`: {source}")]
    Load {
        loader: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "Configuration should be an object, received: {received}. Please check the return value of `load()`"
    )]
    Shape { received: String },

    #[error("Config normalization failed: {0}")]
    Normalize(#[source] anyhow::Error),

    /// Aggregated schema violations. `report` is the formatted text, `errors`
    /// the structured tree it was built from.
    #[error("{report}")]
    Validation { report: String, errors: Vec<ErrorNode> },

    #[error("Custom config validator failed: {0}")]
    Validator(#[source] anyhow::Error),

    #[error("Validated configuration does not fit the target type: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Invalid schema {path}: {message}")]
    Schema { path: String, message: String },
}

impl ConfigError {
    /// Structured violations, when this is a validation failure.
    pub fn violations(&self) -> Option<&[ErrorNode]> {
        match self {
            ConfigError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}
