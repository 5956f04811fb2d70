use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open input file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("input file {path}: missing field `{field}`")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("input file {path}: field `{field}` has invalid value `{value}`")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        value: String,
    },

    #[error("input file {path}: unexpected trailing token `{token}`")]
    TrailingToken { path: PathBuf, token: String },

    #[error("input file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("parameter `{field}` out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("failed to build worker pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to start serial runner thread: {0}")]
    Thread(#[source] io::Error),

    #[error("serial runner thread panicked")]
    Panicked,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("failed to write run log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
