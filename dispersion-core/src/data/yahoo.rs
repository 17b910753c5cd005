//! Yahoo Finance price feed.
//!
//! Fetches daily closes from Yahoo's v8 chart API. Handles rate limiting,
//! retries with exponential backoff, response parsing, and the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; a parse failure surfaces as `ResponseFormatChanged`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{FeedError, FetchWindow, PriceFeed};
use crate::domain::{PriceObservation, PriceSeries};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo Finance price feed.
pub struct YahooFeed {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooFeed {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| FeedError::Client(e.to_string()))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Build the chart API URL for a symbol and an inclusive date window.
    fn chart_url(symbol: &str, window: FetchWindow) -> String {
        let start_ts = window.start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = (window.end + chrono::Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp()
            - 1;
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Parse the chart API response into a price series.
    ///
    /// Rows without a close (holidays, suspended sessions) are skipped, rows
    /// outside the window are dropped, and a repeated date keeps its last row.
    fn parse_response(
        symbol: &str,
        resp: ChartResponse,
        window: FetchWindow,
    ) -> Result<PriceSeries, FeedError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    FeedError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    FeedError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                FeedError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FeedError::ResponseFormatChanged("result array is empty".into()))?;

        // No timestamps at all means the range had no sessions.
        let Some(timestamps) = data.timestamp else {
            return Ok(PriceSeries::empty(symbol));
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FeedError::ResponseFormatChanged("no quote data".into()))?;

        let mut observations: Vec<PriceObservation> = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| FeedError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            if !window.contains(date) {
                continue;
            }

            let obs = PriceObservation::new(date, close)?;
            match observations.last_mut() {
                Some(last) if last.date == date => *last = obs,
                _ => observations.push(obs),
            }
        }

        Ok(PriceSeries::new(symbol, observations)?)
    }

    /// Execute the HTTP request with retry and circuit breaker logic.
    fn fetch_with_retry(&self, symbol: &str, window: FetchWindow) -> Result<PriceSeries, FeedError> {
        if !self.circuit_breaker.is_allowed() {
            tracing::warn!(
                %symbol,
                cooldown_secs = self.circuit_breaker.remaining_cooldown().as_secs(),
                "circuit breaker open, skipping request"
            );
            return Err(FeedError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(symbol, window);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(%symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(FeedError::CircuitBreakerTripped);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        // IP ban: stop talking to the provider altogether
                        tracing::error!(%symbol, "HTTP 403 from chart API, tripping circuit breaker");
                        self.circuit_breaker.trip();
                        return Err(FeedError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(FeedError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(FeedError::AuthenticationRequired(
                            "Yahoo Finance requires authentication".into(),
                        ));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(FeedError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(FeedError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        FeedError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    let series = Self::parse_response(symbol, chart, window)?;
                    self.circuit_breaker.record_success();
                    return Ok(series);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(FeedError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(FeedError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FeedError::Other("max retries exceeded".into())))
    }
}

impl PriceFeed for YahooFeed {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, window: FetchWindow) -> Result<PriceSeries, FeedError> {
        self.fetch_with_retry(symbol, window)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> FetchWindow {
        FetchWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    fn parse(json: &str) -> Result<PriceSeries, FeedError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooFeed::parse_response("SPY", resp, window())
    }

    // 2024-01-02, 2024-01-03, 2024-01-04 at 14:30 UTC
    const TS: &str = "[1704205800, 1704292200, 1704378600]";

    #[test]
    fn parses_closes_in_order() {
        let json = format!(
            r#"{{"chart":{{"result":[{{"timestamp":{TS},"indicators":{{"quote":[{{"close":[470.5,468.8,467.3]}}]}}}}],"error":null}}}}"#
        );
        let series = parse(&json).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), &[470.5, 468.8, 467.3]);
        assert_eq!(
            series.observations()[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn skips_rows_without_close() {
        let json = format!(
            r#"{{"chart":{{"result":[{{"timestamp":{TS},"indicators":{{"quote":[{{"close":[470.5,null,467.3]}}]}}}}],"error":null}}}}"#
        );
        assert_eq!(parse(&json).unwrap().len(), 2);
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(FeedError::SymbolNotFound { .. })));
    }

    #[test]
    fn missing_timestamps_is_an_empty_series() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse(json).unwrap().is_empty());
    }

    #[test]
    fn unknown_error_is_format_change() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"oops"}}}"#;
        assert!(matches!(parse(json), Err(FeedError::ResponseFormatChanged(_))));
    }

    #[test]
    fn chart_url_covers_whole_end_day() {
        let url = YahooFeed::chart_url("SPY", window());
        assert!(url.contains("/chart/SPY?"));
        assert!(url.contains("period1=1704067200"));
        // 2024-02-01T00:00:00Z - 1
        assert!(url.contains("period2=1706745599"));
        assert!(url.contains("interval=1d"));
    }
}
