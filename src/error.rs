//! Error Types
//!
//! Load failures, query failures and their conversions.

use std::io;
use std::path::PathBuf;

use crate::loading::TransitionError;

/// Failure to build a vector store from a source file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("vector file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed vector file at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("invalid vector table: {0}")]
    InvalidTable(String),

    #[error("vector file contains no vectors")]
    Empty,
}

impl LoadError {
    /// Wrap an I/O error, mapping a missing file to `NotFound`
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound(path)
        } else {
            LoadError::Io { path, source }
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        LoadError::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by vector queries
#[derive(Debug, thiserror::Error)]
pub enum WordVecError {
    #[error("Word '{0}' not found in vocabulary")]
    WordNotFound(String),

    #[error("Model not loaded")]
    NotReady,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

pub type Result<T> = std::result::Result<T, WordVecError>;
