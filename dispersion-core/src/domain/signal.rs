//! Three-way classification label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BUY / SELL / HOLD label derived from a single dispersion value.
///
/// These are report labels, not executable orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    /// Price materially below its trailing average.
    Buy,
    /// Price materially above its trailing average.
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_uppercase_and_respects_width() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(format!("{:>6}", Signal::Hold), "  HOLD");
    }

    #[test]
    fn serde_uses_uppercase_labels() {
        assert_eq!(serde_json::to_string(&Signal::Sell).unwrap(), "\"SELL\"");
        let parsed: Signal = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(parsed, Signal::Buy);
    }
}
