//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first value at index period-1).

/// Unweighted mean over the trailing `period` closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Returns `None` for a zero period.
    pub fn new(period: usize) -> Option<Self> {
        (period >= 1).then_some(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn lookback(&self) -> usize {
        self.period - 1
    }

    /// Lazily roll the window over `closes`, yielding `(index, mean)` for
    /// every index with a full window behind it.
    pub fn rolling<'a>(&self, closes: &'a [f64]) -> RollingMean<'a> {
        RollingMean {
            closes,
            period: self.period,
            next: self.lookback(),
        }
    }
}

/// Iterator over the trailing means of a close slice. Cloning it restarts
/// from the clone point; a fresh one from [`Sma::rolling`] restarts from the
/// first full window.
#[derive(Debug, Clone)]
pub struct RollingMean<'a> {
    closes: &'a [f64],
    period: usize,
    next: usize,
}

impl Iterator for RollingMean<'_> {
    type Item = (usize, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.next;
        if i >= self.closes.len() {
            return None;
        }

        // Summed from the window alone so evicted closes leave no rounding
        // residue; an all-zero window reads exactly zero.
        let sum: f64 = self.closes[(i + 1 - self.period)..=i].iter().sum();

        self.next += 1;
        Some((i, sum / self.period as f64))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.closes.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RollingMean<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        let result: Vec<_> = Sma::new(5).unwrap().rolling(&closes).collect();

        assert_eq!(result.len(), 3);
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_eq!(result[0].0, 4);
        assert_approx(result[0].1, 12.0, DEFAULT_EPSILON);
        // SMA[5] = mean(11,12,13,14,15) = 13.0
        assert_approx(result[1].1, 13.0, DEFAULT_EPSILON);
        // SMA[6] = mean(12,13,14,15,16) = 14.0
        assert_eq!(result[2].0, 6);
        assert_approx(result[2].1, 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let closes = [100.0, 200.0, 300.0];
        let result: Vec<f64> = Sma::new(1).unwrap().rolling(&closes).map(|(_, m)| m).collect();
        assert_eq!(result.len(), 3);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(20).unwrap().lookback(), 19);
        assert_eq!(Sma::new(1).unwrap().lookback(), 0);
        assert!(Sma::new(0).is_none());
    }

    #[test]
    fn sma_too_few_values() {
        let closes = [10.0, 11.0];
        let sma = Sma::new(5).unwrap();
        assert_eq!(sma.rolling(&closes).count(), 0);
        assert_eq!(sma.rolling(&closes).len(), 0);
    }

    #[test]
    fn exact_size_is_len_minus_lookback() {
        let closes = [1.0; 10];
        let rolling = Sma::new(4).unwrap().rolling(&closes);
        assert_eq!(rolling.len(), 7);
        assert_eq!(rolling.count(), 7);
    }

    #[test]
    fn mean_depends_only_on_the_window() {
        let sma = Sma::new(2).unwrap();
        for head in [1.98, 1.99] {
            let window = [head, 1.0];
            let alone = sma.rolling(&window).last().unwrap().1;
            for evicted in [0.03, 0.04, 7.77, 1e6, 0.0] {
                let closes = [evicted, head, 1.0];
                let mean = sma.rolling(&closes).last().unwrap().1;
                assert_eq!(mean.to_bits(), alone.to_bits(), "{head} after {evicted}");
            }
        }
    }

    #[test]
    fn zero_window_after_nonzero_reads_exactly_zero() {
        let closes = [0.1, 0.2, 0.0, 0.0];
        let means: Vec<f64> = Sma::new(2).unwrap().rolling(&closes).map(|(_, m)| m).collect();
        assert_eq!(means[2], 0.0);
    }

    #[test]
    fn clone_restarts_from_the_same_position() {
        let closes = [1.0, 2.0, 3.0, 4.0];
        let mut rolling = Sma::new(2).unwrap().rolling(&closes);
        rolling.next();
        let snapshot = rolling.clone();
        assert_eq!(rolling.collect::<Vec<_>>(), snapshot.collect::<Vec<_>>());
    }
}
