//! Historical dispersion statistics for a single symbol.

use serde::{Deserialize, Serialize};

use crate::domain::DispersionPoint;

/// Summary of a dispersion series over its defined points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispersionStats {
    pub mean: f64,
    /// Sample standard deviation; zero for a single point.
    pub std_dev: f64,
    pub max: f64,
    pub min: f64,
    pub current: f64,
    pub days_above: usize,
    pub days_below: usize,
    pub total_days: usize,
}

impl DispersionStats {
    /// Points with an undefined dispersion are skipped. Returns `None` if no
    /// point is defined.
    pub fn from_points(points: &[DispersionPoint]) -> Option<Self> {
        let values: Vec<f64> = points.iter().filter_map(|p| p.dispersion_percent).collect();
        let current = *values.last()?;

        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        Some(Self {
            mean,
            std_dev,
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            current,
            days_above: points.iter().filter(|p| p.is_above_average()).count(),
            days_below: points.iter().filter(|p| p.is_below_average()).count(),
            total_days: n,
        })
    }

    pub fn pct_above(&self) -> f64 {
        self.days_above as f64 / self.total_days as f64 * 100.0
    }

    pub fn pct_below(&self) -> f64 {
        self.days_below as f64 / self.total_days as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;
    use chrono::NaiveDate;

    fn point(close: f64, sma: f64) -> DispersionPoint {
        DispersionPoint::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), close, sma)
    }

    #[test]
    fn summarises_defined_points() {
        // dispersions: +10, -10, +20
        let points = [point(110.0, 100.0), point(90.0, 100.0), point(120.0, 100.0)];
        let stats = DispersionStats::from_points(&points).unwrap();
        assert_approx(stats.mean, 20.0 / 3.0, 1e-9);
        assert_approx(stats.max, 20.0, 1e-9);
        assert_approx(stats.min, -10.0, 1e-9);
        assert_approx(stats.current, 20.0, 1e-9);
        assert_eq!((stats.days_above, stats.days_below, stats.total_days), (2, 1, 3));
        // sample variance = ((10-6.67)^2 + (-10-6.67)^2 + (20-6.67)^2) / 2
        assert_approx(stats.std_dev, 15.275252316519467, 1e-9);
        assert_approx(stats.pct_above(), 200.0 / 3.0, 1e-9);
    }

    #[test]
    fn undefined_points_are_skipped() {
        let points = [point(5.0, 0.0), point(110.0, 100.0)];
        let stats = DispersionStats::from_points(&points).unwrap();
        assert_eq!(stats.total_days, 1);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!((stats.days_above, stats.days_below), (1, 0));
    }

    #[test]
    fn days_on_the_average_count_neither_way() {
        let points = [point(100.0, 100.0), point(90.0, 100.0), point(100.0, 100.0)];
        let stats = DispersionStats::from_points(&points).unwrap();
        assert_eq!((stats.days_above, stats.days_below, stats.total_days), (0, 1, 3));
    }

    #[test]
    fn nothing_defined_is_none() {
        assert!(DispersionStats::from_points(&[]).is_none());
        assert!(DispersionStats::from_points(&[point(1.0, 0.0)]).is_none());
    }
}
