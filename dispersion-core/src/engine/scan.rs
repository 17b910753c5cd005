//! Scanning one symbol or a batch, and splitting results into BUY/SELL.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;

use crate::data::{FetchWindow, PriceFeed};
use crate::domain::{PriceSeries, ScanResult};

use super::classify::classify;
use super::dispersion::compute_series;
use super::error::ScanError;
use super::{DEFAULT_PERIOD, DEFAULT_THRESHOLD};

/// Averaging period, signal threshold, and batch fan-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanParams {
    period: usize,
    threshold: f64,
    parallel: bool,
}

impl ScanParams {
    pub fn new(period: usize, threshold: f64) -> Result<Self, ScanError> {
        if period == 0 {
            return Err(ScanError::InvalidPeriod);
        }
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ScanError::InvalidThreshold(threshold));
        }
        Ok(Self {
            period,
            threshold,
            parallel: true,
        })
    }

    /// Enables or disables rayon fan-out in [`scan_many`].
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            threshold: DEFAULT_THRESHOLD,
            parallel: true,
        }
    }
}

/// Scan one symbol's series: latest dispersion point plus its signal.
pub fn scan_symbol(
    symbol: &str,
    prices: &PriceSeries,
    params: &ScanParams,
) -> Result<ScanResult, ScanError> {
    if prices.is_empty() {
        return Err(ScanError::no_data("feed returned zero rows"));
    }

    let latest = compute_series(prices, params.period)?
        .last()
        .ok_or(ScanError::InsufficientHistory {
            available: prices.len(),
            required: params.period,
        })?;

    let dispersion_percent = latest
        .dispersion_percent
        .ok_or(ScanError::DivisionUndefined { date: latest.date })?;

    Ok(ScanResult {
        symbol: symbol.to_string(),
        latest,
        dispersion_percent,
        signal: classify(dispersion_percent, params.threshold),
    })
}

/// Outcome of scanning a set of symbols.
///
/// Every requested symbol lands in exactly one of `results` or `failures`.
#[derive(Debug, Clone, Default)]
pub struct ScanBatch {
    /// Ascending by dispersion, ties by symbol.
    pub results: Vec<ScanResult>,
    pub failures: BTreeMap<String, ScanError>,
    /// Fetched series of the successful symbols, for charts and exports.
    pub series: BTreeMap<String, PriceSeries>,
}

impl ScanBatch {
    pub fn attempted(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    /// True when no symbol produced a result.
    pub fn is_degraded(&self) -> bool {
        self.results.is_empty()
    }
}

struct SymbolOutcome {
    symbol: String,
    outcome: Result<(ScanResult, PriceSeries), ScanError>,
}

fn scan_one(
    feed: &dyn PriceFeed,
    symbol: &str,
    window: FetchWindow,
    params: &ScanParams,
) -> SymbolOutcome {
    if !feed.is_available() {
        return SymbolOutcome {
            symbol: symbol.to_string(),
            outcome: Err(ScanError::no_data(format!("{} feed unavailable", feed.name()))),
        };
    }

    let outcome = feed
        .fetch(symbol, window)
        .map_err(|e| ScanError::no_data(e.to_string()))
        .and_then(|series| scan_symbol(symbol, &series, params).map(|r| (r, series)));

    SymbolOutcome {
        symbol: symbol.to_string(),
        outcome,
    }
}

/// Fetch and scan every distinct symbol independently.
///
/// One symbol's failure never aborts the batch. Results are sorted ascending
/// by dispersion (most oversold first) with ties broken by symbol, so the
/// output is the same whether or not the work fanned out.
pub fn scan_many(
    feed: &dyn PriceFeed,
    symbols: &[String],
    window: FetchWindow,
    params: &ScanParams,
) -> ScanBatch {
    let mut seen = HashSet::new();
    let distinct: Vec<&str> = symbols
        .iter()
        .map(|s| s.as_str())
        .filter(|s| seen.insert(*s))
        .collect();

    tracing::info!(
        symbols = distinct.len(),
        period = params.period,
        threshold = params.threshold,
        feed = feed.name(),
        "scanning symbols"
    );

    let outcomes: Vec<SymbolOutcome> = if params.parallel {
        distinct
            .par_iter()
            .map(|symbol| scan_one(feed, symbol, window, params))
            .collect()
    } else {
        distinct
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                tracing::debug!("processing {symbol} ({}/{})", i + 1, distinct.len());
                scan_one(feed, symbol, window, params)
            })
            .collect()
    };

    let mut batch = ScanBatch::default();
    for SymbolOutcome { symbol, outcome } in outcomes {
        match outcome {
            Ok((result, series)) => {
                batch.series.insert(symbol, series);
                batch.results.push(result);
            }
            Err(e) => {
                tracing::warn!(%symbol, reason = e.kind(), "could not scan {symbol}: {e}");
                batch.failures.insert(symbol, e);
            }
        }
    }

    batch.results.sort_by(|a, b| {
        a.dispersion_percent
            .total_cmp(&b.dispersion_percent)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    if batch.is_degraded() {
        tracing::warn!("no data retrieved for any symbol");
    }

    batch
}

/// Split results into BUY candidates (most negative first) and SELL
/// candidates (most positive first). HOLD results land in neither.
pub fn partition(results: &[ScanResult], threshold: f64) -> (Vec<ScanResult>, Vec<ScanResult>) {
    let mut buy: Vec<ScanResult> = results
        .iter()
        .filter(|r| r.dispersion_percent <= -threshold)
        .cloned()
        .collect();
    buy.sort_by(|a, b| {
        a.dispersion_percent
            .total_cmp(&b.dispersion_percent)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let mut sell: Vec<ScanResult> = results
        .iter()
        .filter(|r| r.dispersion_percent >= threshold)
        .cloned()
        .collect();
    sell.sort_by(|a, b| {
        b.dispersion_percent
            .total_cmp(&a.dispersion_percent)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    (buy, sell)
}
