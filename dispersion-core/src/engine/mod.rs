//! Dispersion engine: trailing SMA, percentage dispersion, and signals.
//!
//! Everything here is a pure function of its inputs except [`scan_many`],
//! which pulls each symbol's series from a [`PriceFeed`](crate::data::PriceFeed)
//! before handing it to the pure path.

pub mod classify;
pub mod dispersion;
pub mod error;
pub mod scan;

pub use classify::classify;
pub use dispersion::{compute_series, DispersionSeries};
pub use error::ScanError;
pub use scan::{partition, scan_many, scan_symbol, ScanBatch, ScanParams};

/// Default SMA period in trading days.
pub const DEFAULT_PERIOD: usize = 29;

/// Default signal threshold in percent.
pub const DEFAULT_THRESHOLD: f64 = 15.0;
