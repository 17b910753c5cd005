//! Dispersion CLI: SMA dispersion scanner for a stock watch list.
//!
//! Commands:
//! - `scan`: scan the watch list, print the report, optionally chart, export, and email
//! - `test-email`: send a fixed sample alert to verify SMTP settings
//! - `schedule`: run the scan every business day at a fixed time
//! - `analyze`: historical dispersion statistics for one symbol

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dispersion_core::data::{CircuitBreaker, SyntheticFeed, YahooFeed};
use dispersion_core::{compute_series, DispersionStats, FetchWindow, PriceFeed};
use dispersion_runner::config::parse_schedule_time;
use dispersion_runner::report::{compose, render_console, render_symbol_chart, test_summary};
use dispersion_runner::{
    export, logging, run_scan, run_startup_scan, AlertMailer, PipelineReport, ScanOptions,
    ScannerConfig, Scheduler, SmtpMailer,
};

#[derive(Parser)]
#[command(
    name = "dispersion",
    about = "Dispersion scanner: flags stocks trading far from their moving average"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the watch list and report BUY/SELL opportunities.
    Scan {
        /// Comma-separated tickers replacing the configured list (e.g., AAPL,MSFT).
        #[arg(long, value_delimiter = ',')]
        tickers: Option<Vec<String>>,

        /// Test mode: scan only AAPL, MSFT, GOOGL and never send email.
        #[arg(long, default_value_t = false)]
        test: bool,

        /// Run the scan without sending an email alert.
        #[arg(long, default_value_t = false)]
        no_email: bool,

        /// Generate one chart per scanned ticker.
        #[arg(long, default_value_t = false)]
        charts: bool,

        /// Chart directory. Defaults to the configured charts.output_dir.
        #[arg(long)]
        charts_dir: Option<PathBuf>,

        /// Write all results to this CSV file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write the full scan summary to this JSON file.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Use synthetic prices instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Scan tickers one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Send a sample alert to verify the email configuration.
    TestEmail,
    /// Run the scan every business day at a fixed local time.
    Schedule {
        /// Time of day (HH:MM). Defaults to schedule.time from the config.
        #[arg(long)]
        time: Option<String>,

        /// Run one scan immediately before waiting.
        #[arg(long, default_value_t = false)]
        run_now: bool,

        /// Run one scan now (weekdays only) and exit without scheduling.
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Use synthetic prices instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Historical dispersion analysis for one symbol.
    Analyze {
        symbol: String,

        /// SMA period. Defaults to scan.period from the config.
        #[arg(long)]
        period: Option<usize>,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD, inclusive). Defaults to yesterday.
        #[arg(long)]
        end: Option<String>,

        /// Number of most recent rows to print.
        #[arg(long, default_value_t = 10)]
        tail: usize,

        /// Directory to write the chart into.
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Write the full dispersion series to this CSV file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Use synthetic prices instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ScannerConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging)?;

    match cli.command {
        Commands::Scan {
            tickers,
            test,
            no_email,
            charts,
            charts_dir,
            export,
            json,
            synthetic,
            sequential,
        } => {
            let mut config = config;
            if sequential {
                config.scan.parallel = false;
            }
            let charts_dir = charts
                .then(|| charts_dir.unwrap_or_else(|| config.charts.output_dir.clone()));
            let options = ScanOptions {
                tickers,
                test_mode: test,
                send_email: !no_email,
                charts_dir,
                as_of: None,
            };
            run_scan_cmd(&config, &options, synthetic, export.as_deref(), json.as_deref())
        }
        Commands::TestEmail => run_test_email(&config),
        Commands::Schedule {
            time,
            run_now,
            once,
            synthetic,
        } => run_schedule_cmd(&config, time.as_deref(), run_now, once, synthetic),
        Commands::Analyze {
            symbol,
            period,
            start,
            end,
            tail,
            chart,
            export,
            synthetic,
        } => run_analyze(
            &config,
            &symbol,
            period,
            start.as_deref(),
            end.as_deref(),
            tail,
            chart.as_deref(),
            export.as_deref(),
            synthetic,
        ),
    }
}

fn make_feed(synthetic: bool) -> Result<Box<dyn PriceFeed>> {
    if synthetic {
        return Ok(Box::new(SyntheticFeed::new()));
    }
    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    Ok(Box::new(YahooFeed::new(circuit_breaker)?))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn print_pipeline_report(report: &PipelineReport) {
    print!("{}", render_console(&report.summary));

    if let Some(charts) = &report.charts {
        println!("\n{}", "=".repeat(60));
        println!("CHART GENERATION RESULTS");
        println!("{}", "=".repeat(60));
        println!("Total charts: {}", charts.total());
        println!("Successful: {}", charts.rendered.len());
        println!("Failed: {}", charts.failed.len());
        println!("Output directory: {}", charts.output_dir.display());
        if !charts.rendered.is_empty() {
            let names: Vec<&str> = charts.rendered.keys().map(|s| s.as_str()).collect();
            println!("\nCharts generated for: {}", names.join(", "));
        }
        for (symbol, reason) in &charts.failed {
            println!("  {symbol}: {reason}");
        }
    }

    println!("\nEmail: {:?}", report.email);
}

fn run_scan_cmd(
    config: &ScannerConfig,
    options: &ScanOptions,
    synthetic: bool,
    export_path: Option<&Path>,
    json_path: Option<&Path>,
) -> Result<()> {
    let feed = make_feed(synthetic)?;
    let mailer = SmtpMailer::new(config.email.clone());

    let report = run_scan(config, &*feed, Some(&mailer as &dyn AlertMailer), options)?;
    print_pipeline_report(&report);

    if let Some(path) = export_path {
        export::write_file(path, &export::results_to_csv(&report.summary.all)?)?;
        println!("Results exported to: {}", path.display());
    }
    if let Some(path) = json_path {
        export::write_file(path, &export::summary_to_json(&report.summary)?)?;
        println!("Summary written to: {}", path.display());
    }

    tracing::info!(
        opportunities = report.summary.total_opportunities,
        "scan completed"
    );

    if report.summary.tickers_scanned == 0 {
        eprintln!("No data retrieved for any ticker");
        std::process::exit(1);
    }
    Ok(())
}

fn run_test_email(config: &ScannerConfig) -> Result<()> {
    let mailer = SmtpMailer::new(config.email.clone());
    let email = compose(&test_summary(Local::now().naive_local()));
    tracing::info!("sending test email");
    if let Err(e) = mailer.send(&email) {
        bail!("failed to send test email: {e}. Check EMAIL_SENDER, EMAIL_PASSWORD, EMAIL_RECIPIENT and the [email] config section");
    }
    println!("Test email sent successfully!");
    Ok(())
}

fn run_schedule_cmd(
    config: &ScannerConfig,
    time: Option<&str>,
    run_now: bool,
    once: bool,
    synthetic: bool,
) -> Result<()> {
    let at = match time {
        Some(t) => parse_schedule_time(t)?,
        None => config.schedule_time()?,
    };
    let feed = make_feed(synthetic)?;
    let mailer = SmtpMailer::new(config.email.clone());
    let options = ScanOptions {
        charts_dir: Some(config.schedule.charts_dir.clone()),
        ..ScanOptions::default()
    };

    let job = || -> Result<()> {
        let report = run_scan(config, &*feed, Some(&mailer as &dyn AlertMailer), &options)?;
        print_pipeline_report(&report);
        Ok(())
    };

    run_startup_scan(Local::now().date_naive(), run_now, once, job);
    if once {
        return Ok(());
    }

    let scheduler = Scheduler::new(at);
    tracing::info!(time = %at.format("%H:%M"), "scheduler started, scans run Monday to Friday");
    scheduler.run_forever(job)
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    config: &ScannerConfig,
    symbol: &str,
    period: Option<usize>,
    start: Option<&str>,
    end: Option<&str>,
    tail: usize,
    chart_dir: Option<&Path>,
    export_path: Option<&Path>,
    synthetic: bool,
) -> Result<()> {
    let symbol = symbol.trim().to_uppercase();
    let period = period.unwrap_or(config.scan.period);
    if period == 0 {
        bail!("--period must be at least 1");
    }

    let today = Local::now().date_naive();
    let end_date = end.map(parse_date).transpose()?.unwrap_or(today - chrono::Duration::days(1));
    let start_date = start
        .map(parse_date)
        .transpose()?
        .unwrap_or(today - chrono::Duration::days(365));
    if start_date > end_date {
        bail!("--start {start_date} is after --end {end_date}");
    }

    let feed = make_feed(synthetic)?;
    println!("Downloading data for {symbol} from {start_date} to {end_date}...");
    let series = feed.fetch(&symbol, FetchWindow::new(start_date, end_date))?;
    if series.is_empty() {
        bail!("no data found for ticker {symbol}");
    }
    let points: Vec<_> = compute_series(&series, period)?.collect();

    println!("\n{}", "=".repeat(60));
    println!("SMA DISPERSION ANALYSIS - {symbol}");
    println!("{}\n", "=".repeat(60));

    let params = dispersion_core::ScanParams::new(period, config.scan.threshold)?;
    println!("Latest Dispersion Metrics:");
    println!("{}", "-".repeat(60));
    match dispersion_core::scan_symbol(&symbol, &series, &params) {
        Ok(latest) => {
            println!("Ticker: {}", latest.symbol);
            println!("Date: {}", latest.date());
            println!("Close Price: {:.2}", latest.close());
            println!("SMA-{period}: {:.2}", latest.moving_average());
            println!("Dispersion: {:+.2}%", latest.dispersion_percent);
            println!("Signal: {}", latest.signal);
        }
        Err(e) => println!("Unavailable: {e}"),
    }

    println!("\nHistorical Dispersion Statistics:");
    println!("{}", "-".repeat(60));
    match DispersionStats::from_points(&points) {
        Some(stats) => {
            println!("Mean Dispersion: {:.2}%", stats.mean);
            println!("Std Dispersion: {:.2}%", stats.std_dev);
            println!("Max Dispersion: {:.2}%", stats.max);
            println!("Min Dispersion: {:.2}%", stats.min);
            println!("Current Dispersion: {:.2}%", stats.current);
            println!("Days Above SMA: {}", stats.days_above);
            println!("Days Below SMA: {}", stats.days_below);
            println!("Total Days: {}", stats.total_days);
            println!("\nPercentage Above SMA: {:.2}%", stats.pct_above());
            println!("Percentage Below SMA: {:.2}%", stats.pct_below());
        }
        None => println!("No defined dispersion values in range"),
    }

    println!("\nLast {tail} Days Data:");
    println!("{}", "-".repeat(60));
    println!("{:<12} {:>10} {:>10} {:>12}", "Date", "Close", format!("SMA_{period}"), "Dispersion_%");
    for p in points.iter().skip(points.len().saturating_sub(tail)) {
        let dispersion = p
            .dispersion_percent
            .map(|d| format!("{d:+.2}"))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "{:<12} {:>10.2} {:>10.2} {:>12}",
            p.date.to_string(),
            p.close,
            p.moving_average,
            dispersion
        );
    }

    if let Some(dir) = chart_dir {
        let path = render_symbol_chart(dir, &series, &params)?;
        println!("\nChart saved as {}", path.display());
    }
    if let Some(path) = export_path {
        export::write_file(path, &export::series_to_csv(&points)?)?;
        println!("Series exported to: {}", path.display());
    }

    Ok(())
}
