//! Derived per-date dispersion records and per-symbol scan results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::signal::Signal;

/// One fully-windowed date of a dispersion series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispersionPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub moving_average: f64,
    /// `(close - sma) / sma * 100`; `None` when the trailing average is zero.
    pub dispersion_percent: Option<f64>,
}

impl DispersionPoint {
    pub fn new(date: NaiveDate, close: f64, moving_average: f64) -> Self {
        let dispersion_percent = if moving_average == 0.0 {
            None
        } else {
            Some((close - moving_average) / moving_average * 100.0)
        };
        Self {
            date,
            close,
            moving_average,
            dispersion_percent,
        }
    }

    pub fn is_above_average(&self) -> bool {
        self.dispersion_percent.is_some_and(|d| d > 0.0)
    }

    pub fn is_below_average(&self) -> bool {
        self.dispersion_percent.is_some_and(|d| d < 0.0)
    }
}

/// Latest dispersion reading for one symbol plus its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub symbol: String,
    pub latest: DispersionPoint,
    /// Resolved dispersion of `latest`; always defined for a successful scan.
    pub dispersion_percent: f64,
    pub signal: Signal,
}

impl ScanResult {
    pub fn date(&self) -> NaiveDate {
        self.latest.date
    }

    pub fn close(&self) -> f64 {
        self.latest.close
    }

    pub fn moving_average(&self) -> f64 {
        self.latest.moving_average
    }
}
