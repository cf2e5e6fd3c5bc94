//! Error types for notification handling

use std::path::PathBuf;

use thiserror::Error;

use crate::chat::ChatError;

/// Errors raised while loading or resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no room configured for job and no default room set")]
    MissingRoom,

    #[error("invalid build server url {0:?}: expected http:// or https://")]
    InvalidServerUrl(String),
}

/// Errors surfaced by the dispatcher.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to publish notification for {project} #{build}: {source}")]
    Publish {
        project: String,
        build: u64,
        #[source]
        source: ChatError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for dispatcher operations
pub type Result<T> = std::result::Result<T, NotifyError>;
