use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config format: .{0}")]
    UnsupportedFormat(String),

    /// Required credentials or identifiers are absent.
    #[error("missing required configuration: {}", keys.join(", "))]
    Missing { keys: Vec<String> },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Startup configuration failures surface under this name in the service.
pub type ConfigError = Error;

pub type Result<T> = std::result::Result<T, Error>;
