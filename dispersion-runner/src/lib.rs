//! Dispersion Runner: everything around the engine.
//!
//! This crate builds on `dispersion-core` to provide:
//! - TOML configuration with environment overrides for SMTP credentials
//! - Tracing setup (stderr plus log file)
//! - The scan pipeline: fetch, scan, summarize, chart, alert
//! - Console report, alert email composition, SVG charts
//! - SMTP delivery behind the `AlertMailer` trait
//! - CSV/JSON export
//! - Business-day scheduling

pub mod config;
pub mod export;
pub mod logging;
pub mod mailer;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod summary;

pub use config::{ConfigError, ScannerConfig};
pub use export::ExportError;
pub use logging::LoggingError;
pub use mailer::{AlertMailer, EmailError, SmtpMailer};
pub use pipeline::{run_scan, EmailOutcome, PipelineReport, ScanOptions, SkipReason, TEST_TICKERS};
pub use report::{AlertEmail, ChartBatch, ChartError};
pub use scheduler::{
    is_business_day, next_run_after, run_scheduled_scan, run_startup_scan, RunOutcome, Scheduler,
};
pub use summary::{ScanFailure, ScanSummary};
