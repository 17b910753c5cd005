//! compute_series: per-date SMA and dispersion over a price series.

use crate::domain::{DispersionPoint, PriceObservation, PriceSeries};
use crate::indicators::{RollingMean, Sma};

use super::error::ScanError;

/// Lazy, finite, restartable sequence of [`DispersionPoint`]s.
///
/// Yields exactly `len(prices) - period + 1` points in ascending date order.
/// Points whose trailing average is zero carry `dispersion_percent: None`
/// instead of being dropped, so the count never changes.
#[derive(Debug, Clone)]
pub struct DispersionSeries<'a> {
    observations: &'a [PriceObservation],
    means: RollingMean<'a>,
}

impl Iterator for DispersionSeries<'_> {
    type Item = DispersionPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let (i, mean) = self.means.next()?;
        let obs = self.observations[i];
        Some(DispersionPoint::new(obs.date, obs.close, mean))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.means.size_hint()
    }
}

impl ExactSizeIterator for DispersionSeries<'_> {}

/// Compute the SMA/dispersion series for `prices`.
///
/// Fails with [`ScanError::InvalidPeriod`] for `period == 0` and with
/// [`ScanError::InsufficientHistory`] when fewer than `period` observations
/// exist. A partial series is never returned.
pub fn compute_series(prices: &PriceSeries, period: usize) -> Result<DispersionSeries<'_>, ScanError> {
    let sma = Sma::new(period).ok_or(ScanError::InvalidPeriod)?;
    if prices.len() < period {
        return Err(ScanError::InsufficientHistory {
            available: prices.len(),
            required: period,
        });
    }
    Ok(DispersionSeries {
        observations: prices.observations(),
        means: sma.rolling(prices.closes()),
    })
}
