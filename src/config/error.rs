use std::path::PathBuf;
use thiserror::Error;

use super::overlay::DroppedOverride;
use super::overrides::OverrideParseError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unsupported config file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("config file '{0}' must contain a mapping at the top level")]
    NotAMapping(PathBuf),

    #[error("failed to resolve working directory: {0}")]
    WorkingDir(#[source] std::io::Error),

    #[error("invalid boot flags: {0}")]
    Flags(#[from] clap::Error),

    #[error("invalid override: {0}")]
    Override(#[from] OverrideParseError),

    #[error("overrides rejected: {}", join_dropped(.0))]
    OverridesRejected(Vec<DroppedOverride>),

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] serde_yaml::Error),

    #[error("circular reference detected in configuration")]
    CircularReference,

    #[error("referenced path not found: {0}")]
    ReferenceNotFound(String),

    #[error("invalid reference path: {0}")]
    InvalidReferencePath(String),

    #[error("cannot reference non-scalar value: {0}")]
    NonScalarReference(String),

    #[error("unclosed reference (missing '}}')")]
    UnclosedReference,
}

fn join_dropped(dropped: &[DroppedOverride]) -> String {
    dropped
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
