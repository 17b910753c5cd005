//! Synthetic price feed for offline runs and demos.
//!
//! Produces a deterministic random walk per symbol, anchored at a fixed
//! epoch so a close depends only on (symbol, date) and never on the window
//! it was fetched through. These prices are clearly fake; callers must opt
//! in explicitly (`--synthetic`).

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{FeedError, FetchWindow, PriceFeed};
use crate::domain::{PriceObservation, PriceSeries};

/// First day of every walk. Windows starting earlier walk from their own
/// start instead.
fn walk_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or(NaiveDate::MIN)
}

/// Weekday-only random walk starting from a fixed price.
#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    start_price: f64,
    daily_range: f64,
}

impl SyntheticFeed {
    pub fn new() -> Self {
        Self {
            start_price: 100.0,
            daily_range: 0.03,
        }
    }
}

impl Default for SyntheticFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceFeed for SyntheticFeed {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, window: FetchWindow) -> Result<PriceSeries, FeedError> {
        // Deterministic seed from symbol name
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut observations = Vec::new();
        let mut price = self.start_price;
        let mut current = walk_epoch().min(window.start);

        while current <= window.end {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                let daily_return: f64 = rng.gen_range(-self.daily_range..self.daily_range);
                price *= 1.0 + daily_return;
                if window.contains(current) {
                    observations.push(PriceObservation::new(current, price)?);
                }
            }
            current += chrono::Duration::days(1);
        }

        Ok(PriceSeries::new(symbol, observations)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> FetchWindow {
        FetchWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
    }

    #[test]
    fn same_symbol_same_series() {
        let feed = SyntheticFeed::new();
        let a = feed.fetch("AAPL", window()).unwrap();
        let b = feed.fetch("AAPL", window()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_symbols_differ() {
        let feed = SyntheticFeed::new();
        let a = feed.fetch("AAPL", window()).unwrap();
        let b = feed.fetch("MSFT", window()).unwrap();
        assert_ne!(a.closes(), b.closes());
    }

    #[test]
    fn skips_weekends_and_stays_positive() {
        let series = SyntheticFeed::new().fetch("SPY", window()).unwrap();
        assert!(series
            .observations()
            .iter()
            .all(|o| !matches!(o.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(series.closes().iter().all(|c| *c > 0.0));
        // Jan 1 .. Mar 1 2024 holds 45 weekdays
        assert_eq!(series.len(), 45);
    }

    #[test]
    fn close_does_not_depend_on_the_window() {
        let feed = SyntheticFeed::new();
        let end = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let trailing = |days| FetchWindow::new(end - chrono::Duration::days(days), end);
        let short = feed.fetch("AAPL", trailing(60)).unwrap();
        let long = feed.fetch("AAPL", trailing(365)).unwrap();

        assert!(long.len() > short.len());
        let tail = &long.observations()[long.len() - short.len()..];
        assert_eq!(tail, short.observations());
    }
}
