//! Batch scanning with an in-memory feed: partial failures, failure kinds,
//! degraded batches.

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

use dispersion_core::{
    partition, scan_many, FeedError, FetchWindow, PriceFeed, PriceSeries, ScanError, ScanParams,
    Signal,
};

enum Canned {
    Series(Vec<f64>),
    Empty,
    Unreachable,
}

struct MemoryFeed {
    canned: HashMap<&'static str, Canned>,
}

impl PriceFeed for MemoryFeed {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, symbol: &str, window: FetchWindow) -> Result<PriceSeries, FeedError> {
        match self.canned.get(symbol) {
            Some(Canned::Series(closes)) => Ok(PriceSeries::from_closes(
                symbol,
                closes
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| (window.start + Duration::days(i as i64), c)),
            )?),
            Some(Canned::Empty) => Ok(PriceSeries::empty(symbol)),
            Some(Canned::Unreachable) => Err(FeedError::NetworkUnreachable("connection refused".into())),
            None => Err(FeedError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
        }
    }
}

fn window() -> FetchWindow {
    FetchWindow::trailing(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(), 60)
}

fn closes_ending_at(last: f64) -> Vec<f64> {
    let mut closes = vec![100.0; 28];
    closes.push(last);
    closes
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn one_empty_symbol_does_not_abort_the_batch() {
    let feed = MemoryFeed {
        canned: HashMap::from([("X", Canned::Empty), ("Y", Canned::Series(closes_ending_at(100.0)))]),
    };
    let batch = scan_many(&feed, &symbols(&["X", "Y"]), window(), &ScanParams::default());

    assert_eq!(batch.results.len(), 1);
    assert_eq!(batch.results[0].symbol, "Y");
    assert_eq!(batch.results[0].signal, Signal::Hold);
    assert_eq!(batch.failures.len(), 1);
    assert!(matches!(batch.failures["X"], ScanError::NoData { .. }));
    assert_eq!(batch.attempted(), 2);
    assert!(!batch.is_degraded());
    assert!(batch.series.contains_key("Y"));
    assert!(!batch.series.contains_key("X"));
}

#[test]
fn failure_kinds_are_kept_apart() {
    let feed = MemoryFeed {
        canned: HashMap::from([
            ("DOWN", Canned::Unreachable),
            ("SHORT", Canned::Series(vec![10.0; 5])),
            ("ZERO", Canned::Series(vec![0.0; 29])),
        ]),
    };
    let batch = scan_many(
        &feed,
        &symbols(&["DOWN", "SHORT", "ZERO", "GONE"]),
        window(),
        &ScanParams::default(),
    );

    assert!(batch.is_degraded());
    assert_eq!(batch.failures["DOWN"].kind(), "no_data");
    assert_eq!(batch.failures["GONE"].kind(), "no_data");
    assert_eq!(
        batch.failures["SHORT"],
        ScanError::InsufficientHistory {
            available: 5,
            required: 29
        }
    );
    assert!(matches!(batch.failures["ZERO"], ScanError::DivisionUndefined { .. }));
}

#[test]
fn duplicate_symbols_are_scanned_once() {
    let feed = MemoryFeed {
        canned: HashMap::from([("A", Canned::Series(closes_ending_at(100.0)))]),
    };
    let batch = scan_many(&feed, &symbols(&["A", "A", "A"]), window(), &ScanParams::default());
    assert_eq!(batch.results.len(), 1);
    assert_eq!(batch.attempted(), 1);
}

#[test]
fn results_are_most_oversold_first_and_partition_cleanly() {
    let feed = MemoryFeed {
        canned: HashMap::from([
            ("HOLD", Canned::Series(closes_ending_at(101.0))),
            ("DIP", Canned::Series(closes_ending_at(80.0))),
            ("POP", Canned::Series(closes_ending_at(130.0))),
            ("TIE", Canned::Series(closes_ending_at(80.0))),
        ]),
    };
    let params = ScanParams::default();
    let batch = scan_many(&feed, &symbols(&["HOLD", "POP", "TIE", "DIP"]), window(), &params);

    let order: Vec<_> = batch.results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(order, vec!["DIP", "TIE", "HOLD", "POP"]);

    let (buy, sell) = partition(&batch.results, params.threshold());
    assert_eq!(buy.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(), vec!["DIP", "TIE"]);
    assert_eq!(sell.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(), vec!["POP"]);
    assert!(buy.iter().all(|r| (r.dispersion_percent + 19.44).abs() < 0.01));
}

#[test]
fn empty_symbol_list_is_degraded_but_not_an_error() {
    let feed = MemoryFeed {
        canned: HashMap::new(),
    };
    let batch = scan_many(&feed, &[], window(), &ScanParams::default());
    assert!(batch.is_degraded());
    assert!(batch.failures.is_empty());
}

struct ClosedFeed;

impl PriceFeed for ClosedFeed {
    fn name(&self) -> &str {
        "closed"
    }

    fn fetch(&self, _symbol: &str, _window: FetchWindow) -> Result<PriceSeries, FeedError> {
        panic!("fetch must not be called while the feed is unavailable");
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[test]
fn unavailable_feed_fails_every_symbol_without_fetching() {
    let batch = scan_many(&ClosedFeed, &symbols(&["A", "B"]), window(), &ScanParams::default());
    assert!(batch.is_degraded());
    assert_eq!(batch.failures.len(), 2);
    assert!(batch.failures.values().all(|e| e.kind() == "no_data"));
}
