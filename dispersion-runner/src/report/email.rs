//! Alert email composition: subject, plain-text body, HTML body.

use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime};
use dispersion_core::{DispersionPoint, ScanResult, Signal, DEFAULT_PERIOD, DEFAULT_THRESHOLD};

use super::signed_percent;
use crate::summary::ScanSummary;

const DISCLAIMER: &str = "Disclaimer: This is an automated alert for informational purposes only.\n\
This is not financial advice. Always do your own research.";

/// A composed alert, ready for any [`AlertMailer`](crate::mailer::AlertMailer).
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub fn compose(summary: &ScanSummary) -> AlertEmail {
    AlertEmail {
        subject: subject(summary),
        text: plain_text(summary),
        html: html(summary),
    }
}

pub fn subject(summary: &ScanSummary) -> String {
    format!(
        "NYSE Alert: {} Opportunities Detected - {}",
        summary.total_opportunities,
        summary.scan_time_label()
    )
}

fn text_rule() -> String {
    "=".repeat(50)
}

pub fn plain_text(summary: &ScanSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "NYSE INVESTMENT OPPORTUNITY ALERT");
    let _ = writeln!(out, "{}\n", text_rule());
    let _ = writeln!(out, "Scan Time: {}", summary.scan_time_label());
    let _ = writeln!(out, "Tickers Analyzed: {}", summary.tickers_scanned);
    let _ = writeln!(out, "SMA Period: {} days", summary.period);
    let _ = writeln!(out, "Dispersion Threshold: +/-{:.1}%", summary.threshold);
    let _ = writeln!(out, "Total Opportunities Found: {}", summary.total_opportunities);

    let sides = [
        ("BUY OPPORTUNITIES (Price below SMA)", "BUY", &summary.buy),
        ("SELL OPPORTUNITIES (Price above SMA)", "SELL", &summary.sell),
    ];
    for (title, side, results) in sides {
        let _ = writeln!(out, "\n{}\n{title}\n{}", text_rule(), text_rule());
        if results.is_empty() {
            let _ = writeln!(out, "No {side} opportunities detected.");
        }
        for r in results.iter() {
            let _ = writeln!(out, "\nTicker: {}", r.symbol);
            let _ = writeln!(out, "  Close: ${:.2}", r.close());
            let _ = writeln!(out, "  SMA-{}: ${:.2}", summary.period, r.moving_average());
            let _ = writeln!(out, "  Dispersion: {}", signed_percent(r.dispersion_percent));
            let _ = writeln!(out, "  Signal: {}", r.signal);
        }
    }

    let _ = writeln!(out, "\n{}\nALL TICKERS SUMMARY\n{}", text_rule(), text_rule());
    for r in &summary.all {
        let _ = writeln!(
            out,
            "{:<6} | {:>9} | {:>8} | {}",
            r.symbol,
            format!("${:.2}", r.close()),
            signed_percent(r.dispersion_percent),
            r.signal
        );
    }

    let _ = writeln!(out, "\n---\n{DISCLAIMER}");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn signal_class(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "buy",
        Signal::Sell => "sell",
        Signal::Hold => "hold",
    }
}

fn html_table(out: &mut String, period: usize, results: &[ScanResult]) {
    let _ = writeln!(out, "<table>");
    let _ = writeln!(
        out,
        "<tr><th>Ticker</th><th>Close Price</th><th>SMA-{period}</th><th>Dispersion %</th><th>Signal</th></tr>"
    );
    for r in results {
        let class = signal_class(r.signal);
        let _ = writeln!(
            out,
            "<tr><td><strong>{}</strong></td><td>${:.2}</td><td>${:.2}</td><td class=\"{class}\">{}</td><td class=\"{class}\">{}</td></tr>",
            escape_html(&r.symbol),
            r.close(),
            r.moving_average(),
            signed_percent(r.dispersion_percent),
            r.signal
        );
    }
    let _ = writeln!(out, "</table>");
}

const STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; }
h1 { color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px; }
h2 { color: #2980b9; margin-top: 30px; }
.summary-box { background-color: #f8f9fa; border-left: 4px solid #3498db; padding: 15px; margin: 20px 0; }
table { width: 100%; border-collapse: collapse; margin: 20px 0; }
th, td { padding: 12px; text-align: left; border-bottom: 1px solid #ddd; }
th { background-color: #3498db; color: white; }
.buy { color: #27ae60; font-weight: bold; }
.sell { color: #e74c3c; font-weight: bold; }
.hold { color: #7f8c8d; }
.alert-buy { background-color: #d4edda; border: 1px solid #c3e6cb; padding: 15px; border-radius: 5px; }
.alert-sell { background-color: #f8d7da; border: 1px solid #f5c6cb; padding: 15px; border-radius: 5px; }
.footer { margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; font-size: 12px; color: #7f8c8d; }";

pub fn html(summary: &ScanSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<!DOCTYPE html>\n<html>\n<head>\n<style>\n{STYLE}\n</style>\n</head>\n<body>");
    let _ = writeln!(out, "<h1>NYSE Investment Opportunity Alert</h1>");
    let _ = writeln!(
        out,
        "<div class=\"summary-box\">\n\
<strong>Scan Time:</strong> {}<br>\n\
<strong>Tickers Analyzed:</strong> {}<br>\n\
<strong>SMA Period:</strong> {} days<br>\n\
<strong>Dispersion Threshold:</strong> +/-{:.1}%<br>\n\
<strong>Total Opportunities Found:</strong> {}\n\
</div>",
        summary.scan_time_label(),
        summary.tickers_scanned,
        summary.period,
        summary.threshold,
        summary.total_opportunities
    );

    let _ = writeln!(out, "<h2>BUY Opportunities</h2>");
    if summary.buy.is_empty() {
        let _ = writeln!(out, "<p>No BUY opportunities detected.</p>");
    } else {
        let _ = writeln!(
            out,
            "<div class=\"alert-buy\">{} ticker(s) trading at least {:.1}% below their SMA.</div>",
            summary.buy.len(),
            summary.threshold
        );
        html_table(&mut out, summary.period, &summary.buy);
    }

    let _ = writeln!(out, "<h2>SELL Opportunities</h2>");
    if summary.sell.is_empty() {
        let _ = writeln!(out, "<p>No SELL opportunities detected.</p>");
    } else {
        let _ = writeln!(
            out,
            "<div class=\"alert-sell\">{} ticker(s) trading at least {:.1}% above their SMA.</div>",
            summary.sell.len(),
            summary.threshold
        );
        html_table(&mut out, summary.period, &summary.sell);
    }

    let _ = writeln!(out, "<h2>All Tickers Summary</h2>");
    html_table(&mut out, summary.period, &summary.all);

    let _ = writeln!(
        out,
        "<div class=\"footer\">\n<p>{}</p>\n</div>\n</body>\n</html>",
        DISCLAIMER.replace('\n', "<br>\n")
    );
    out
}

fn fixture(
    date: NaiveDate,
    symbol: &str,
    close: f64,
    sma: f64,
    dispersion: f64,
    signal: Signal,
) -> ScanResult {
    ScanResult {
        symbol: symbol.into(),
        latest: DispersionPoint::new(date, close, sma),
        dispersion_percent: dispersion,
        signal,
    }
}

/// Fixed summary sent by `test-email` to check the mail setup end to end.
pub fn test_summary(scan_time: NaiveDateTime) -> ScanSummary {
    let date = scan_time.date();
    let test1 = fixture(date, "TEST1", 100.0, 120.0, -16.67, Signal::Hold);
    let test2 = fixture(date, "TEST2", 150.0, 120.0, 25.0, Signal::Sell);
    let test3 = fixture(date, "TEST3", 80.0, 100.0, -20.0, Signal::Buy);
    ScanSummary {
        scan_time,
        period: DEFAULT_PERIOD,
        threshold: DEFAULT_THRESHOLD,
        tickers_requested: 3,
        tickers_scanned: 3,
        all: vec![test1, test2.clone(), test3.clone()],
        buy: vec![test3],
        sell: vec![test2],
        failures: Vec::new(),
        total_opportunities: 2,
    }
}
