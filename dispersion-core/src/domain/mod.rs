//! Domain types for the dispersion scanner.

pub mod point;
pub mod price;
pub mod signal;

pub use point::{DispersionPoint, ScanResult};
pub use price::{PriceObservation, PriceSeries, SeriesError};
pub use signal::Signal;
