//! CSV and JSON export of scan results and per-symbol dispersion series.

use std::path::Path;

use dispersion_core::{DispersionPoint, ScanResult};
use thiserror::Error;

use crate::summary::ScanSummary;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

/// One row per result.
///
/// Columns: symbol, date, close, sma, dispersion_pct, signal
pub fn results_to_csv(results: &[ScanResult]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["symbol", "date", "close", "sma", "dispersion_pct", "signal"])?;
    for r in results {
        wtr.write_record([
            r.symbol.clone(),
            r.date().to_string(),
            format!("{:.2}", r.close()),
            format!("{:.2}", r.moving_average()),
            format!("{:.2}", r.dispersion_percent),
            r.signal.as_str().to_string(),
        ])?;
    }
    finish(wtr)
}

/// One row per dispersion point. `dispersion_pct` is empty where the SMA is
/// zero.
///
/// Columns: date, close, sma, dispersion_pct
pub fn series_to_csv(points: &[DispersionPoint]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "close", "sma", "dispersion_pct"])?;
    for p in points {
        wtr.write_record([
            p.date.to_string(),
            format!("{:.2}", p.close),
            format!("{:.2}", p.moving_average),
            p.dispersion_percent
                .map(|d| format!("{d:.2}"))
                .unwrap_or_default(),
        ])?;
    }
    finish(wtr)
}

pub fn summary_to_json(summary: &ScanSummary) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dispersion_core::Signal;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn results_csv_has_header_and_rows() {
        let results = vec![ScanResult {
            symbol: "TEST3".into(),
            latest: DispersionPoint::new(date(), 80.0, 100.0),
            dispersion_percent: -20.0,
            signal: Signal::Buy,
        }];
        let csv = results_to_csv(&results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "symbol,date,close,sma,dispersion_pct,signal");
        assert_eq!(lines[1], "TEST3,2025-03-07,80.00,100.00,-20.00,BUY");
    }

    #[test]
    fn undefined_dispersion_is_blank() {
        let points = vec![
            DispersionPoint::new(date(), 0.0, 0.0),
            DispersionPoint::new(date().succ_opt().unwrap(), 12.0, 10.0),
        ];
        let csv = series_to_csv(&points).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "2025-03-07,0.00,0.00,");
        assert_eq!(lines[2], "2025-03-08,12.00,10.00,20.00");
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("scan.csv");
        write_file(&path, "a,b\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n");
    }
}
