//! Price feed trait and structured error types.
//!
//! The PriceFeed trait abstracts over data sources (Yahoo Finance, the
//! synthetic random walk, in-memory fixtures) so the scan can swap
//! implementations and mock for tests.

use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

/// Structured error types for feed operations.
///
/// The scan treats every variant as "no data" for the symbol; the variants
/// exist so logs and reports can say why.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("feed error: {0}")]
    Other(String),
}

/// Inclusive calendar range of daily closes to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `lookback_days` calendar days back from `today`, ending yesterday.
    /// Today's still-forming bar is never part of the window.
    pub fn trailing(today: NaiveDate, lookback_days: u32) -> Self {
        Self {
            start: today - Duration::days(i64::from(lookback_days)),
            end: today - Duration::days(1),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Trait for price feeds.
///
/// Implementations return an ordered series or an explicit error. An empty
/// series is a valid answer ("nothing in that range") and is rejected later
/// by the scan as no-data.
pub trait PriceFeed: Send + Sync {
    /// Human-readable name of this feed.
    fn name(&self) -> &str;

    /// Fetch daily closes for a symbol over a date window.
    fn fetch(&self, symbol: &str, window: FetchWindow) -> Result<PriceSeries, FeedError>;

    /// Check if the feed is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}
