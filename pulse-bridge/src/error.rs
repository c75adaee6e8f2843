//! Bridge error types.
//!
//! Every failure mode has a named variant. No stringly-typed errors.

use pulse_pipeline::AnalyticsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid parameter for {op}: {reason}")]
    InvalidParameter { op: String, reason: String },

    #[error("No rows match the current selection")]
    NoData,

    #[error("{operation} needs at least {required} periods, got {available}")]
    InsufficientData {
        operation: &'static str,
        required: usize,
        available: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AnalyticsError> for BridgeError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::EmptyResult => BridgeError::NoData,
            AnalyticsError::InsufficientData {
                operation,
                required,
                available,
            } => BridgeError::InsufficientData {
                operation,
                required,
                available,
            },
            // Only reported inside the pipeline, never returned.
            AnalyticsError::UnmappedCategory { .. } => BridgeError::NoData,
        }
    }
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
