//! Pipeline error types.
//!
//! Every failure mode has a named variant. `EmptyResult` and
//! `InsufficientData` are expected outcomes the front end renders as a
//! "no data" state, not faults.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Dimension;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    #[error("no rows match the current filter selection")]
    EmptyResult,

    #[error("{operation} needs at least {required} periods, got {available}")]
    InsufficientData {
        operation: &'static str,
        required: usize,
        available: usize,
    },

    #[error("{dimension} value '{value}' has no entry in the lookup table")]
    UnmappedCategory { dimension: Dimension, value: String },
}

/// Result type alias for aggregation operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Failures at the ingestion boundary: reading the CSV or the config file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("CSV header error: {0}")]
    Header(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("invalid {column} '{value}' at line {line}")]
    InvalidDate {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
}
