//! classify: map one dispersion value to BUY / SELL / HOLD.

use crate::domain::Signal;

/// Classify `dispersion_percent` against a positive `threshold`.
///
/// Both boundaries are inclusive: exactly `-threshold` is BUY and exactly
/// `threshold` is SELL. A NaN input falls through to HOLD.
pub fn classify(dispersion_percent: f64, threshold: f64) -> Signal {
    if dispersion_percent <= -threshold {
        Signal::Buy
    } else if dispersion_percent >= threshold {
        Signal::Sell
    } else {
        Signal::Hold
    }
}
