//! Error handling for SoDAR ingestion, assembly and extraction.
//!
//! Every fatal condition of the pipeline has its own variant. Malformed
//! value cells are not errors: they degrade to the missing-value sentinel.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SodarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error(
        "Record count mismatch in file: {path} - {speeds} speed, {directions} direction, {timestamps} timestamp records"
    )]
    RecordCountMismatch {
        path: PathBuf,
        speeds: usize,
        directions: usize,
        timestamps: usize,
    },

    #[error("Invalid record in file: {path} (line {line}) - {reason}")]
    InvalidRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("No height declaration found in file: {path}")]
    MissingHeights { path: PathBuf },

    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Station directory not found at path: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("No daily log files found in: {path}")]
    NoSources { path: PathBuf },

    #[error("File name does not encode a day: {path}")]
    InvalidFileName { path: PathBuf },

    #[error("Height list of day {label} differs from day {reference}")]
    HeightMismatch { label: String, reference: String },

    #[error(
        "Continuity violation at slot {position}: {previous} is not followed by {expected} (found {found})"
    )]
    ContinuityViolation {
        position: usize,
        previous: String,
        expected: String,
        found: String,
    },

    #[error(
        "No nights were available for selection '{selection}'. Try a partial or all-nights selection to see if values exist at all"
    )]
    EmptySelection { selection: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cache error for {path}: {reason}")]
    Cache { path: PathBuf, reason: String },
}

impl SodarError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a cache error
    pub fn cache(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Cache {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SodarError>;
