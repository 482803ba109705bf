//! Error taxonomy for command-set processing.
//!
//! Missing and invalid inputs are fatal to the operation that found them.
//! The multi-set driver is the only place errors are caught and recorded.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("bad file pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invoking '{command}' returned exit code {exit_code}")]
    CommandFailed { command: String, exit_code: i32 },
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a YAML error with the file it came from.
    pub fn yaml(path: impl Into<PathBuf>, source: serde_yaml_ng::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }
}
