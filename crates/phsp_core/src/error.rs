//! # Phase-Space Error Types
//!
//! Fatal and reportable errors of a phase-space run.
//!
//! Running out of bytes in the middle of a record is NOT an error: the
//! decoder reports it as [`StreamEnd`](crate::StreamEnd). A direction whose
//! `u² + v²` exceeds one is repaired in place and never surfaces either.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort (or refuse to start) a phase-space run.
#[derive(Error, Debug)]
pub enum PhspError {
    /// An input file or stream could not be opened.
    #[error("input unavailable: {}: {source}", path.display())]
    InputUnavailable {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Geometry that cannot describe a physical aperture or grid.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A malformed line in a geometry table.
    #[error("{}:{line}: {reason}", path.display())]
    Table {
        /// The table file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// A report could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Output {
        /// The output path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl PhspError {
    /// Wraps an open failure for `path`.
    pub fn input_unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::InputUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors that must abort the run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InputUnavailable { .. } | Self::InvalidConfig(_))
    }
}

/// Result type for phase-space operations.
pub type PhspResult<T> = Result<T, PhspError>;
