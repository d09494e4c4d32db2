use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The server answered, but not with a success status.
    #[error("{url} answered with status {status}")]
    Fetch { url: String, status: StatusCode },
    /// The request never produced a response (connect, timeout, body read).
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Archive(String),
    #[error("{path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Protocol(String),
    #[error("{0}")]
    Config(String),
}

impl Error {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem { path: path.into(), source }
    }
}
