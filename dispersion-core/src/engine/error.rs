//! Per-symbol scan failures.

use chrono::NaiveDate;
use thiserror::Error;

/// Why a symbol produced no [`ScanResult`](crate::domain::ScanResult).
///
/// `NoData` and `InsufficientHistory` are deliberately distinct: the first
/// means the feed gave nothing, the second that it gave too little for the
/// averaging window.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    #[error("no data: {reason}")]
    NoData { reason: String },

    #[error("insufficient history: {available} observations, need {required}")]
    InsufficientHistory { available: usize, required: usize },

    #[error("trailing average is zero on {date}, dispersion is undefined")]
    DivisionUndefined { date: NaiveDate },

    #[error("SMA period must be >= 1")]
    InvalidPeriod,

    #[error("threshold must be positive and finite, got {0}")]
    InvalidThreshold(f64),
}

impl ScanError {
    pub fn no_data(reason: impl Into<String>) -> Self {
        Self::NoData {
            reason: reason.into(),
        }
    }

    /// Short machine-friendly label for reports and exports.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::NoData { .. } => "no_data",
            ScanError::InsufficientHistory { .. } => "insufficient_history",
            ScanError::DivisionUndefined { .. } => "division_undefined",
            ScanError::InvalidPeriod => "invalid_period",
            ScanError::InvalidThreshold(_) => "invalid_threshold",
        }
    }
}
