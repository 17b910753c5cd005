//! Dispersion Core: price series, SMA dispersion, signals, and price feeds.
//!
//! This crate holds the whole computation of the scanner:
//! - Domain types (observations, series, dispersion points, scan results)
//! - Rolling SMA over close prices
//! - The dispersion engine: compute a series, classify, scan one symbol,
//!   scan a batch with partial-failure semantics, partition BUY/SELL
//! - Historical dispersion statistics
//! - Price feeds (Yahoo Finance chart API, synthetic random walk)

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod stats;

pub use data::{FeedError, FetchWindow, PriceFeed};
pub use domain::{DispersionPoint, PriceObservation, PriceSeries, ScanResult, SeriesError, Signal};
pub use engine::{
    classify, compute_series, partition, scan_many, scan_symbol, DispersionSeries, ScanBatch,
    ScanError, ScanParams, DEFAULT_PERIOD, DEFAULT_THRESHOLD,
};
pub use stats::DispersionStats;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public types can cross rayon worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceSeries>();
        require_sync::<PriceSeries>();
        require_send::<ScanResult>();
        require_sync::<ScanResult>();
        require_send::<ScanError>();
        require_sync::<ScanError>();
        require_send::<ScanBatch>();
        require_sync::<ScanBatch>();
        require_send::<ScanParams>();
        require_sync::<ScanParams>();
        require_send::<FeedError>();
        require_sync::<FeedError>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<data::YahooFeed>();
        require_sync::<data::YahooFeed>();
        require_send::<data::SyntheticFeed>();
        require_sync::<data::SyntheticFeed>();
    }

    /// The feed trait is object safe and shareable across threads.
    #[test]
    fn price_feed_trait_object_is_send_sync() {
        fn require<T: Send + Sync + ?Sized>() {}
        require::<dyn PriceFeed>();
    }
}
