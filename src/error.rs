//! Per-file fatal errors raised while cleaning or profiling a CSV extract.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort processing of a single file.
///
/// Row-level problems never surface here; they are absorbed into the
/// counters of [`crate::process::CleanStats`].
#[derive(Error, Debug)]
pub enum CleanError {
    /// The input path does not exist or could not be opened as a file.
    #[error("input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The input produced zero records, so there is no header.
    #[error("CSV file {} is empty or missing header", .0.display())]
    EmptyInput(PathBuf),

    /// I/O failure on the input or output stream.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unrecoverable CSV reader or writer failure.
    #[error("CSV error on {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl CleanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CleanError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        CleanError::Csv {
            path: path.into(),
            source,
        }
    }

    /// The path the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            CleanError::InputNotFound(p) | CleanError::EmptyInput(p) => p,
            CleanError::Io { path, .. } | CleanError::Csv { path, .. } => path,
        }
    }
}
