//! Scanner configuration loaded from TOML, with environment overrides for
//! the SMTP credentials.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use dispersion_core::{ScanParams, DEFAULT_PERIOD, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default watch list.
pub const DEFAULT_TICKERS: [&str; 20] = [
    "AAPL", "MSFT", "GOOGL", "VIST", "META", "NVDA", "TSLA", "JPM", "V", "MU", "WMT", "NU", "CRWV",
    "ONDS", "GGAL", "NFLX", "CEPU", "EDN", "BMA", "LOMA",
];

/// Calendar days of history requested per symbol.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Full scanner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScannerConfig {
    pub scan: ScanConfig,
    pub email: EmailConfig,
    pub charts: ChartsConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    pub tickers: Vec<String>,
    /// SMA period in trading days.
    pub period: usize,
    /// Signal threshold in percent.
    pub threshold: f64,
    pub lookback_days: u32,
    /// Fan symbol fetches out over the rayon pool.
    pub parallel: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect(),
            period: DEFAULT_PERIOD,
            threshold: DEFAULT_THRESHOLD,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            parallel: true,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender: Option<String>,
    pub password: Option<String>,
    pub recipient: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".into(),
            smtp_port: 587,
            sender: None,
            password: None,
            recipient: None,
        }
    }
}

impl EmailConfig {
    /// Names of the credential fields that are unset or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.sender) {
            missing.push("sender");
        }
        if blank(&self.password) {
            missing.push("password");
        }
        if blank(&self.recipient) {
            missing.push("recipient");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("sender", &self.sender)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("recipient", &self.recipient)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartsConfig {
    pub output_dir: PathBuf,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("charts"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local wall-clock time, `HH:MM`.
    pub time: String,
    pub charts_dir: PathBuf,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time: "09:00".into(),
            charts_dir: PathBuf::from("daily_charts"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: Some(PathBuf::from("dispersion_scanner.log")),
        }
    }
}

/// Parse an `HH:MM` wall-clock time.
pub fn parse_schedule_time(s: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| ConfigError::invalid("schedule.time", format!("'{s}' is not HH:MM ({e})")))
}

impl ScannerConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&s)
    }

    /// File (or defaults), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply SMTP_SERVER, SMTP_PORT, EMAIL_SENDER, EMAIL_PASSWORD and
    /// EMAIL_RECIPIENT from `lookup`. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(server) = get("SMTP_SERVER") {
            self.email.smtp_server = server;
        }
        if let Some(port) = get("SMTP_PORT") {
            self.email.smtp_port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("SMTP_PORT", format!("'{port}' is not a port")))?;
        }
        if let Some(sender) = get("EMAIL_SENDER") {
            self.email.sender = Some(sender);
        }
        if let Some(password) = get("EMAIL_PASSWORD") {
            self.email.password = Some(password);
        }
        if let Some(recipient) = get("EMAIL_RECIPIENT") {
            self.email.recipient = Some(recipient);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scan = &self.scan;
        if scan.period == 0 {
            return Err(ConfigError::invalid("scan.period", "must be at least 1"));
        }
        if !scan.threshold.is_finite() || scan.threshold <= 0.0 {
            return Err(ConfigError::invalid(
                "scan.threshold",
                format!("must be positive and finite, got {}", scan.threshold),
            ));
        }
        if (scan.lookback_days as usize) <= scan.period {
            return Err(ConfigError::invalid(
                "scan.lookback_days",
                format!(
                    "{} calendar days cannot cover a {}-day SMA",
                    scan.lookback_days, scan.period
                ),
            ));
        }
        if scan.tickers.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::invalid("scan.tickers", "list is empty"));
        }
        if self.email.smtp_server.trim().is_empty() {
            return Err(ConfigError::invalid("email.smtp_server", "must not be blank"));
        }
        parse_schedule_time(&self.schedule.time)?;
        Ok(())
    }

    /// Engine parameters for this configuration.
    pub fn scan_params(&self) -> Result<ScanParams, ConfigError> {
        ScanParams::new(self.scan.period, self.scan.threshold)
            .map(|p| p.with_parallelism(self.scan.parallel))
            .map_err(|e| ConfigError::invalid("scan", e.to_string()))
    }

    pub fn schedule_time(&self) -> Result<NaiveTime, ConfigError> {
        parse_schedule_time(&self.schedule.time)
    }
}
