//! One scan's outcome, as handed to the console, email, and export layers.

use chrono::NaiveDateTime;
use dispersion_core::{partition, ScanBatch, ScanParams, ScanResult};
use serde::Serialize;

/// Timestamp format used in reports and the email subject.
pub const SCAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A symbol that produced no result, with the failure kind and message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFailure {
    pub symbol: String,
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub scan_time: NaiveDateTime,
    pub period: usize,
    pub threshold: f64,
    pub tickers_requested: usize,
    pub tickers_scanned: usize,
    /// Every successful result, ascending by dispersion.
    pub all: Vec<ScanResult>,
    /// Most negative first.
    pub buy: Vec<ScanResult>,
    /// Most positive first.
    pub sell: Vec<ScanResult>,
    pub failures: Vec<ScanFailure>,
    pub total_opportunities: usize,
}

impl ScanSummary {
    pub fn from_batch(scan_time: NaiveDateTime, params: &ScanParams, batch: &ScanBatch) -> Self {
        let (buy, sell) = partition(&batch.results, params.threshold());
        let failures = batch
            .failures
            .iter()
            .map(|(symbol, e)| ScanFailure {
                symbol: symbol.clone(),
                kind: e.kind(),
                reason: e.to_string(),
            })
            .collect();

        Self {
            scan_time,
            period: params.period(),
            threshold: params.threshold(),
            tickers_requested: batch.attempted(),
            tickers_scanned: batch.results.len(),
            all: batch.results.clone(),
            total_opportunities: buy.len() + sell.len(),
            buy,
            sell,
            failures,
        }
    }

    pub fn scan_time_label(&self) -> String {
        self.scan_time.format(SCAN_TIME_FORMAT).to_string()
    }

    pub fn has_opportunities(&self) -> bool {
        self.total_opportunities > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dispersion_core::{classify, DispersionPoint, ScanError};

    fn result(symbol: &str, close: f64, sma: f64) -> ScanResult {
        let latest = DispersionPoint::new(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(), close, sma);
        let d = latest.dispersion_percent.unwrap();
        ScanResult {
            symbol: symbol.into(),
            latest,
            dispersion_percent: d,
            signal: classify(d, 15.0),
        }
    }

    #[test]
    fn summary_partitions_and_counts() {
        let mut batch = ScanBatch::default();
        batch.results = vec![
            result("DIP", 80.0, 100.0),
            result("FLAT", 100.0, 100.0),
            result("POP", 125.0, 100.0),
        ];
        batch
            .failures
            .insert("GONE".into(), ScanError::no_data("feed returned zero rows"));

        let scan_time = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let summary = ScanSummary::from_batch(scan_time, &ScanParams::default(), &batch);

        assert_eq!(summary.tickers_requested, 4);
        assert_eq!(summary.tickers_scanned, 3);
        assert_eq!(summary.total_opportunities, 2);
        assert_eq!(summary.buy[0].symbol, "DIP");
        assert_eq!(summary.sell[0].symbol, "POP");
        assert_eq!(summary.failures[0].symbol, "GONE");
        assert_eq!(summary.failures[0].kind, "no_data");
        assert_eq!(summary.scan_time_label(), "2025-03-10 09:00:00");
    }
}
