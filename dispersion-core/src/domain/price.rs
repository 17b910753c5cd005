//! Price observations and the per-symbol price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a price series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("invalid close {close} on {date}: must be finite and non-negative")]
    InvalidClose { date: NaiveDate, close: f64 },

    #[error("dates must be strictly increasing: {previous} is followed by {next}")]
    NotIncreasing { previous: NaiveDate, next: NaiveDate },
}

/// One daily close for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceObservation {
    /// A zero close is accepted (halted or defaulted print); NaN, infinities
    /// and negative prices are not.
    pub fn new(date: NaiveDate, close: f64) -> Result<Self, SeriesError> {
        if !close.is_finite() || close < 0.0 {
            return Err(SeriesError::InvalidClose { date, close });
        }
        Ok(Self { date, close })
    }
}

/// Time-ordered closes for a single symbol.
///
/// Dates are strictly increasing. The series is never mutated after
/// construction; an empty series is legal and means the feed had nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    observations: Vec<PriceObservation>,
    closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        observations: Vec<PriceObservation>,
    ) -> Result<Self, SeriesError> {
        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::NotIncreasing {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        let closes = observations.iter().map(|o| o.close).collect();
        Ok(Self {
            symbol: symbol.into(),
            observations,
            closes,
        })
    }

    /// Build a series from raw `(date, close)` pairs, validating each one.
    pub fn from_closes(
        symbol: impl Into<String>,
        closes: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, SeriesError> {
        let observations = closes
            .into_iter()
            .map(|(date, close)| PriceObservation::new(date, close))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(symbol, observations)
    }

    /// An empty series for `symbol`.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            observations: Vec::new(),
            closes: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Close prices in date order.
    pub fn closes(&self) -> &[f64] {
        &self.closes
    }
}
