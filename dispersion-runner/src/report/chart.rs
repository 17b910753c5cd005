//! Per-symbol SVG charts: close vs SMA on top, dispersion bars below.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dispersion_core::{classify, compute_series, DispersionPoint, PriceSeries, ScanError, ScanParams, Signal};
use plotters::prelude::*;
use thiserror::Error;

const SIZE: (u32, u32) = (1200, 800);
const PRICE_PANEL_HEIGHT: u32 = 460;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to create chart directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot chart series: {0}")]
    Series(#[from] ScanError),

    #[error("chart rendering failed: {0}")]
    Render(String),
}

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

/// File name for a symbol's chart.
pub fn chart_file_name(symbol: &str) -> String {
    format!("{symbol}_analysis.svg")
}

fn zone_color(signal: Signal) -> RGBColor {
    match signal {
        Signal::Buy => RGBColor(39, 174, 96),
        Signal::Sell => RGBColor(231, 76, 60),
        Signal::Hold => RGBColor(127, 140, 141),
    }
}

/// Render `series` into `dir` and return the written path.
pub fn render_symbol_chart(
    dir: &Path,
    series: &PriceSeries,
    params: &ScanParams,
) -> Result<PathBuf, ChartError> {
    let points: Vec<DispersionPoint> = compute_series(series, params.period())?.collect();

    std::fs::create_dir_all(dir).map_err(|source| ChartError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(chart_file_name(series.symbol()));

    draw(&path, series.symbol(), &points, params)?;
    tracing::debug!(symbol = series.symbol(), path = %path.display(), "chart written");
    Ok(path)
}

fn draw(
    path: &Path,
    symbol: &str,
    points: &[DispersionPoint],
    params: &ScanParams,
) -> Result<(), ChartError> {
    let threshold = params.threshold();
    let n = points.len();
    let x_max = n.max(2) as f64 - 1.0;

    let date_label = |x: &f64| -> String {
        let i = x.round();
        if i < 0.0 {
            return String::new();
        }
        points
            .get(i as usize)
            .map(|p| p.date.format("%m-%d").to_string())
            .unwrap_or_default()
    };

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let (upper, lower) = root.split_vertically(PRICE_PANEL_HEIGHT);

    // Price panel
    let (lo, hi) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (
            lo.min(p.close).min(p.moving_average),
            hi.max(p.close).max(p.moving_average),
        )
    });
    let pad = ((hi - lo) * 0.05).max(0.01);

    let latest_signal = points
        .last()
        .and_then(|p| p.dispersion_percent)
        .map(|d| classify(d, threshold).as_str())
        .unwrap_or("N/A");
    let caption = format!(
        "{symbol} - Close vs {}-day SMA ({latest_signal})",
        params.period()
    );

    let mut price_chart = ChartBuilder::on(&upper)
        .caption(caption, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, (lo - pad)..(hi + pad))
        .map_err(render_err)?;

    price_chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&date_label)
        .y_desc("Price ($)")
        .draw()
        .map_err(render_err)?;

    price_chart
        .draw_series(LineSeries::new(
            points.iter().enumerate().map(|(i, p)| (i as f64, p.close)),
            BLUE.stroke_width(2),
        ))
        .map_err(render_err)?
        .label("Close")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    price_chart
        .draw_series(LineSeries::new(
            points
                .iter()
                .enumerate()
                .map(|(i, p)| (i as f64, p.moving_average)),
            RED.stroke_width(2),
        ))
        .map_err(render_err)?
        .label(format!("SMA-{}", params.period()))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    price_chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    // Dispersion panel
    let bars: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.dispersion_percent.map(|d| (i as f64, d)))
        .collect();
    let extent = bars.iter().map(|(_, d)| d.abs()).fold(threshold, f64::max) * 1.1;

    let mut dispersion_chart = ChartBuilder::on(&lower)
        .caption("Dispersion from SMA (%)", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(x_max + 0.5), -extent..extent)
        .map_err(render_err)?;

    dispersion_chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&date_label)
        .y_desc("Dispersion (%)")
        .draw()
        .map_err(render_err)?;

    dispersion_chart
        .draw_series(bars.iter().map(|&(x, d)| {
            let color = zone_color(classify(d, threshold));
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, d)], color.filled())
        }))
        .map_err(render_err)?;

    for level in [threshold, 0.0, -threshold] {
        let style = if level == 0.0 {
            BLACK.stroke_width(1)
        } else {
            BLACK.mix(0.6).stroke_width(1)
        };
        dispersion_chart
            .draw_series(LineSeries::new(
                vec![(-0.5, level), (x_max + 0.5, level)],
                style,
            ))
            .map_err(render_err)?;
    }

    root.present().map_err(render_err)?;
    Ok(())
}

/// Outcome of rendering a batch of charts.
#[derive(Debug, Default)]
pub struct ChartBatch {
    pub output_dir: PathBuf,
    pub rendered: BTreeMap<String, PathBuf>,
    pub failed: BTreeMap<String, String>,
}

impl ChartBatch {
    pub fn total(&self) -> usize {
        self.rendered.len() + self.failed.len()
    }

    /// Record symbols that had no series to draw. An already rendered or
    /// failed symbol keeps its first entry.
    pub fn record_missing<S, R>(&mut self, missing: impl IntoIterator<Item = (S, R)>)
    where
        S: Into<String>,
        R: ToString,
    {
        for (symbol, reason) in missing {
            let symbol = symbol.into();
            if self.rendered.contains_key(&symbol) {
                continue;
            }
            self.failed
                .entry(symbol)
                .or_insert_with(|| format!("no price data: {}", reason.to_string()));
        }
    }
}

/// Render one chart per series. A failed chart is logged and recorded, never
/// fatal to the rest.
pub fn render_all<'a>(
    dir: &Path,
    series: impl IntoIterator<Item = &'a PriceSeries>,
    params: &ScanParams,
) -> ChartBatch {
    let mut batch = ChartBatch {
        output_dir: dir.to_path_buf(),
        ..ChartBatch::default()
    };
    for s in series {
        match render_symbol_chart(dir, s, params) {
            Ok(path) => {
                batch.rendered.insert(s.symbol().to_string(), path);
            }
            Err(e) => {
                tracing::error!(symbol = s.symbol(), "chart generation failed: {e}");
                batch.failed.insert(s.symbol().to_string(), e.to_string());
            }
        }
    }
    tracing::info!(
        rendered = batch.rendered.len(),
        failed = batch.failed.len(),
        dir = %dir.display(),
        "charts generated"
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        PriceSeries::from_closes(
            symbol,
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| (base + Duration::days(i as i64), c)),
        )
        .unwrap()
    }

    #[test]
    fn file_name_follows_symbol() {
        assert_eq!(chart_file_name("AAPL"), "AAPL_analysis.svg");
    }

    #[test]
    fn writes_svg_for_series() {
        let dir = tempfile::tempdir().unwrap();
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.4).sin() * 20.0).collect();
        let params = ScanParams::new(10, 15.0).unwrap();
        let path = render_symbol_chart(dir.path(), &series("WAVE", &closes), &params).unwrap();

        assert_eq!(path, dir.path().join("WAVE_analysis.svg"));
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("WAVE"));
    }

    #[test]
    fn short_series_is_a_chart_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_symbol_chart(dir.path(), &series("TINY", &[1.0, 2.0]), &ScanParams::default())
            .unwrap_err();
        assert!(matches!(err, ChartError::Series(ScanError::InsufficientHistory { .. })));
    }

    #[test]
    fn batch_records_each_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let params = ScanParams::new(5, 15.0).unwrap();
        let good = series("GOOD", &[10.0, 11.0, 12.0, 11.0, 10.0, 13.0, 9.0]);
        let short = series("SHORT", &[10.0, 11.0]);
        let batch = render_all(dir.path(), [&good, &short], &params);

        assert_eq!(batch.total(), 2);
        assert!(batch.rendered["GOOD"].exists());
        assert!(batch.failed.contains_key("SHORT"));
    }

    #[test]
    fn symbols_without_series_count_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let params = ScanParams::new(5, 15.0).unwrap();
        let good = series("GOOD", &[10.0, 11.0, 12.0, 11.0, 10.0, 13.0, 9.0]);
        let mut batch = render_all(dir.path(), [&good], &params);
        batch.record_missing([("GONE", "feed returned zero rows"), ("GOOD", "stale")]);

        assert_eq!(batch.total(), 2);
        assert!(batch.rendered.contains_key("GOOD"));
        assert!(!batch.failed.contains_key("GOOD"));
        assert!(batch.failed["GONE"].contains("feed returned zero rows"));
    }
}
