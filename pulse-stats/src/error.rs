//! Stats error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("need at least {required} observations, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("season length must be positive")]
    InvalidSeasonLength,
}

pub type StatsResult<T> = Result<T, StatsError>;
