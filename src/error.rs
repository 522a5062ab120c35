use crate::config::ConfigError;
use crate::context::BoxError;
use crate::git::GitError;
use thiserror::Error;

/// Top-level error type for the svc-fnd library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("application context requires a configuration")]
    MissingConfig,

    #[error("entry '{name}' failed: {source}")]
    Entry { name: String, source: BoxError },

    #[error("git metadata error: {0}")]
    Git(#[from] GitError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
