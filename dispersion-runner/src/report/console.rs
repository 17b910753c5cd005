//! Plain-text scan report for the terminal.

use std::fmt::Write;

use dispersion_core::ScanResult;

use super::{rule, signed_percent};
use crate::summary::ScanSummary;

const WIDTH: usize = 60;

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", rule(WIDTH));
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", rule(WIDTH));
}

fn opportunity_line(out: &mut String, r: &ScanResult) {
    let _ = writeln!(
        out,
        "  {}: ${:.2} (Dispersion: {})",
        r.symbol,
        r.close(),
        signed_percent(r.dispersion_percent)
    );
}

/// Render the full report: header, all tickers, BUY and SELL sections.
pub fn render_console(summary: &ScanSummary) -> String {
    let mut out = String::new();

    section(&mut out, "SCAN RESULTS");
    let _ = writeln!(out, "Scan Time: {}", summary.scan_time_label());
    let _ = writeln!(
        out,
        "Tickers Scanned: {} of {}",
        summary.tickers_scanned, summary.tickers_requested
    );
    let _ = writeln!(out, "SMA Period: {} days", summary.period);
    let _ = writeln!(out, "Dispersion Threshold: +/-{:.1}%", summary.threshold);
    let _ = writeln!(out, "Total Opportunities: {}", summary.total_opportunities);

    if !summary.all.is_empty() {
        section(&mut out, "ALL TICKERS:");
        let sma_header = format!("SMA-{}", summary.period);
        let _ = writeln!(
            out,
            "{:<8} {:>10} {:>10} {:>12} {:>8}",
            "Ticker", "Close", sma_header, "Dispersion", "Signal"
        );
        let _ = writeln!(out, "{}", "-".repeat(WIDTH));
        for r in &summary.all {
            let _ = writeln!(
                out,
                "{:<8} {:>10} {:>10} {:>12} {:>8}",
                r.symbol,
                format!("${:.2}", r.close()),
                format!("${:.2}", r.moving_average()),
                signed_percent(r.dispersion_percent),
                r.signal
            );
        }
    }

    if summary.buy.is_empty() {
        let _ = writeln!(
            out,
            "\nNo BUY opportunities detected (dispersion > -{:.1}%)",
            summary.threshold
        );
    } else {
        section(&mut out, "BUY OPPORTUNITIES (Price significantly BELOW SMA):");
        for r in &summary.buy {
            opportunity_line(&mut out, r);
        }
    }

    if summary.sell.is_empty() {
        let _ = writeln!(
            out,
            "\nNo SELL opportunities detected (dispersion < +{:.1}%)",
            summary.threshold
        );
    } else {
        section(&mut out, "SELL OPPORTUNITIES (Price significantly ABOVE SMA):");
        for r in &summary.sell {
            opportunity_line(&mut out, r);
        }
    }

    if !summary.failures.is_empty() {
        section(&mut out, "SKIPPED TICKERS:");
        for f in &summary.failures {
            let _ = writeln!(out, "  {}: {}", f.symbol, f.reason);
        }
    }

    out
}
