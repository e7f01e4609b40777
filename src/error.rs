//! Failure taxonomy for the loading pipeline.
//!
//! Recoverable structural problems (a row with the wrong number of fields)
//! never surface here: the loader skips them and retries. Only conditions the
//! loader cannot work around cross the API boundary as a [`LoadError`].

use std::{io, path::PathBuf};

use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// The file is missing, unreadable, or permission was denied.
    #[error("Cannot access {path:?}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The first line did not yield a usable delimiter.
    #[error("Cannot detect delimiter for {path:?}: {reason}")]
    DelimiterDetection {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<Box<LoadError>>,
    },

    /// Parsing failed and the offending line could not be isolated, or the
    /// retry ceiling was reached.
    #[error(
        "Unable to parse {path:?}: {reason} (skipped lines: [{}])",
        .skipped.iter().join(", ")
    )]
    UnrecoverableParse {
        path: PathBuf,
        reason: String,
        skipped: Vec<u64>,
    },

    #[error("Line {line} of {path:?} is not valid {encoding}")]
    Decode {
        path: PathBuf,
        line: u64,
        encoding: &'static str,
    },
}

impl LoadError {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Raw line numbers that had been excluded when the load gave up.
    pub fn skipped_lines(&self) -> &[u64] {
        match self {
            LoadError::UnrecoverableParse { skipped, .. } => skipped,
            _ => &[],
        }
    }
}
