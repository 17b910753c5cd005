//! One end-to-end scan: fetch, compute, summarize, then the optional chart
//! and email side effects.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use dispersion_core::{scan_many, FetchWindow, PriceFeed, PriceSeries};

use crate::config::{ConfigError, ScannerConfig};
use crate::mailer::AlertMailer;
use crate::report::{self, ChartBatch};
use crate::summary::ScanSummary;

/// Symbols scanned in test mode.
pub const TEST_TICKERS: [&str; 3] = ["AAPL", "MSFT", "GOOGL"];

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Replaces the configured watch list.
    pub tickers: Option<Vec<String>>,
    /// Scan [`TEST_TICKERS`] and never send email.
    pub test_mode: bool,
    pub send_email: bool,
    /// Render one chart per scanned symbol into this directory.
    pub charts_dir: Option<PathBuf>,
    /// Clock override; defaults to local now.
    pub as_of: Option<NaiveDateTime>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            tickers: None,
            test_mode: false,
            send_email: true,
            charts_dir: None,
            as_of: None,
        }
    }
}

/// Trim, upper-case, and drop blank entries.
pub fn normalize_tickers<I, S>(tickers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tickers
        .into_iter()
        .map(|t| t.as_ref().trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

impl ScanOptions {
    pub fn resolve_tickers(&self, configured: &[String]) -> Vec<String> {
        if self.test_mode {
            return normalize_tickers(TEST_TICKERS);
        }
        match &self.tickers {
            Some(list) => normalize_tickers(list),
            None => normalize_tickers(configured),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TestMode,
    Disabled,
    NoOpportunities,
    NoMailer,
    NotConfigured,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::TestMode => "test mode",
            SkipReason::Disabled => "email disabled",
            SkipReason::NoOpportunities => "no opportunities",
            SkipReason::NoMailer => "no mailer available",
            SkipReason::NotConfigured => "email configuration incomplete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOutcome {
    Sent,
    Skipped(SkipReason),
    Failed(String),
}

/// Everything a scan produced. Chart and email failures are recorded here
/// and never invalidate `summary`.
#[derive(Debug)]
pub struct PipelineReport {
    pub summary: ScanSummary,
    /// Fetched series of the scanned symbols, for export and analysis.
    pub series: Vec<PriceSeries>,
    pub charts: Option<ChartBatch>,
    pub email: EmailOutcome,
}

/// Run a scan over the configured (or overridden) tickers.
pub fn run_scan(
    config: &ScannerConfig,
    feed: &dyn PriceFeed,
    mailer: Option<&dyn AlertMailer>,
    options: &ScanOptions,
) -> Result<PipelineReport, ConfigError> {
    let params = config.scan_params()?;
    let scan_time = options
        .as_of
        .unwrap_or_else(|| Local::now().naive_local());
    let tickers = options.resolve_tickers(&config.scan.tickers);
    let window = FetchWindow::trailing(scan_time.date(), config.scan.lookback_days);

    tracing::info!(
        tickers = tickers.len(),
        start = %window.start,
        end = %window.end,
        test_mode = options.test_mode,
        "starting dispersion scan"
    );

    let batch = scan_many(feed, &tickers, window, &params);
    let summary = ScanSummary::from_batch(scan_time, &params, &batch);
    tracing::info!(
        scanned = summary.tickers_scanned,
        requested = summary.tickers_requested,
        buy = summary.buy.len(),
        sell = summary.sell.len(),
        "scan complete"
    );

    let charts = options.charts_dir.as_deref().map(|dir| {
        let mut charts = report::render_all(dir, batch.series.values(), &params);
        charts.record_missing(batch.failures.iter().map(|(s, e)| (s.as_str(), e)));
        charts
    });

    let email = deliver(&summary, mailer, options);

    Ok(PipelineReport {
        summary,
        series: batch.series.into_values().collect(),
        charts,
        email,
    })
}

fn deliver(
    summary: &ScanSummary,
    mailer: Option<&dyn AlertMailer>,
    options: &ScanOptions,
) -> EmailOutcome {
    let skip = |reason: SkipReason| {
        tracing::info!(%reason, "email not sent");
        EmailOutcome::Skipped(reason)
    };

    if options.test_mode {
        return skip(SkipReason::TestMode);
    }
    if !options.send_email {
        return skip(SkipReason::Disabled);
    }
    if !summary.has_opportunities() {
        return skip(SkipReason::NoOpportunities);
    }
    let Some(mailer) = mailer else {
        return skip(SkipReason::NoMailer);
    };
    if !mailer.is_configured() {
        tracing::warn!("email configuration incomplete; set EMAIL_SENDER, EMAIL_PASSWORD, EMAIL_RECIPIENT");
        return EmailOutcome::Skipped(SkipReason::NotConfigured);
    }

    let email = report::compose(summary);
    match mailer.send(&email) {
        Ok(()) => EmailOutcome::Sent,
        Err(e) => {
            tracing::error!("failed to send alert email: {e}");
            EmailOutcome::Failed(e.to_string())
        }
    }
}
