/*!
 * Error types for the talkalign application.
 *
 * This module contains custom error types for the stores, the alignment
 * collaborator and the application as a whole, using the thiserror crate
 * for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing the input and output stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// A store line failed to deserialize or lacks a required field
    #[error("Malformed record at {}:{line}: {reason}", path.display())]
    MalformedRecord {
        /// Store the line was read from
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// A unit lacks one of the configured language documents
    #[error("Unit {unit_id} has no '{language}' document")]
    MissingLanguage {
        /// Canonical id of the unit
        unit_id: String,
        /// Language code that was looked up
        language: String,
    },

    /// The output store or commit log could not be written
    #[error("Write failed while {context}: {source}")]
    IoWrite {
        /// What was being written
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A store could not be opened or read
    #[error("Read failed while {context}: {source}")]
    Io {
        /// What was being read
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The commit log claims more committed bytes than the output store holds
    #[error("Commit log records {committed} committed bytes but the output store has {actual}")]
    CommitLogMismatch {
        /// Largest end offset recorded in the commit log
        committed: u64,
        /// Actual length of the output store
        actual: u64,
    },
}

impl StoreError {
    /// Create a malformed record error
    pub fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Create a write error with context
    pub fn write(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoWrite {
            context: context.into(),
            source,
        }
    }

    /// Create a read error with context
    pub fn read(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Errors that can occur when calling the alignment collaborator
#[derive(Error, Debug)]
pub enum AlignerError {
    /// Error when sending the request fails
    #[error("Alignment request failed: {0}")]
    Request(String),

    /// Error returned by the alignment service itself
    #[error("Alignment service responded with error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message from the service
        message: String,
    },

    /// Error when the response body cannot be decoded
    #[error("Invalid alignment response: {0}")]
    InvalidResponse(String),

    /// The aligner refused to run
    #[error("Aligner unavailable: {0}")]
    Unavailable(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from one of the stores
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the aligner
    #[error("Aligner error: {0}")]
    Aligner(#[from] AlignerError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
