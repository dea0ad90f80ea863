use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::authorization::Capability;

#[derive(Error, Debug)]
pub enum SharkError {
    #[error("Failed to decode workspace file: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode workspace file: {0}")]
    Encode(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Access to {0} was not granted")]
    NotAuthorized(Capability),

    #[error("Preference store error: {0}")]
    Store(String),

    #[error("Workspace {0} was not found")]
    NotFound(String),

    #[error("Workspace {0} already exists in the list")]
    Duplicate(String),

    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl SharkError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SharkError>;
