//! Error type shared by the planner.

use thiserror::Error;

/// Errors raised at the planner boundary.
///
/// Algorithmic steps (clustering, route ordering) never produce these; they
/// degrade to fallback results instead. Only configuration problems,
/// malformed input and I/O surface as errors.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("distance matrix is not square: row {row} has {len} entries, expected {expected}")]
    MatrixShape {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("distance matrix entry ({row}, {col}) is not a finite non-negative value")]
    MatrixValue { row: usize, col: usize },

    #[error("duplicate shop id `{0}`")]
    DuplicateShop(String),

    #[error("schedule generation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ScheduleError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        ScheduleError::InvalidConfig(message.into())
    }
}
