use super::Indicator;

/// Relative Strength Index with Wilder smoothing.
///
/// The first sample only seeds the previous price. The next `period` changes
/// accumulate into initial average gain/loss; after that both averages are
/// Wilder-smoothed: `avg = (avg * (period - 1) + x) / period`.
///
/// Edge rule: `avg_loss == 0` forces RSI to 100 and is checked before
/// `avg_gain == 0` forcing 0, so a perfectly flat series reads 100.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_value: Option<f64>,
    gains: Vec<f64>,
    losses: Vec<f64>,
    avg_gain: Option<f64>,
    avg_loss: Option<f64>,
    current: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        Self {
            period,
            prev_value: None,
            gains: Vec::new(),
            losses: Vec::new(),
            avg_gain: None,
            avg_loss: None,
            current: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    fn recompute(&mut self) {
        let avg_gain = self.avg_gain.unwrap_or(0.0);
        let avg_loss = self.avg_loss.unwrap_or(0.0);

        // avg_loss == 0 wins the tie on a flat series
        if avg_loss == 0.0 {
            self.current = Some(100.0);
            return;
        }
        if avg_gain == 0.0 {
            self.current = Some(0.0);
            return;
        }

        let rs = avg_gain / avg_loss;
        self.current = Some(100.0 - 100.0 / (1.0 + rs));
    }
}

impl Indicator for Rsi {
    fn update(&mut self, value: f64) {
        let prev = match self.prev_value {
            None => {
                self.prev_value = Some(value);
                return;
            }
            Some(prev) => prev,
        };

        let change = value - prev;
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        if self.gains.len() < self.period {
            self.gains.push(gain);
            self.losses.push(loss);
            if self.gains.len() == self.period {
                self.avg_gain = Some(self.gains.iter().sum::<f64>() / self.period as f64);
                self.avg_loss = Some(self.losses.iter().sum::<f64>() / self.period as f64);
                self.recompute();
            }
        } else {
            let n = self.period as f64;
            self.avg_gain = Some((self.avg_gain.unwrap_or(0.0) * (n - 1.0) + gain) / n);
            self.avg_loss = Some((self.avg_loss.unwrap_or(0.0) * (n - 1.0) + loss) / n);
            self.recompute();
        }

        self.prev_value = Some(value);
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    fn value(&self) -> Option<f64> {
        self.current
    }

    fn reset(&mut self) {
        self.prev_value = None;
        self.gains.clear();
        self.losses.clear();
        self.avg_gain = None;
        self.avg_loss = None;
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(rsi: &mut Rsi, prices: impl IntoIterator<Item = f64>) {
        for p in prices {
            rsi.update(p);
        }
    }

    #[test]
    fn rsi_needs_period_plus_one_samples() {
        let mut rsi = Rsi::new(3);
        feed(&mut rsi, [10.0, 11.0, 12.0]);
        assert!(!rsi.is_ready());
        rsi.update(13.0);
        assert!(rsi.is_ready());
    }

    #[test]
    fn rsi_strictly_increasing_reads_100() {
        let mut rsi = Rsi::new(5);
        feed(&mut rsi, (0..20).map(|i| 100.0 + i as f64));
        assert!((rsi.value().unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_strictly_decreasing_reads_0() {
        let mut rsi = Rsi::new(5);
        feed(&mut rsi, (0..20).map(|i| 100.0 - i as f64));
        assert!((rsi.value().unwrap() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_flat_series_reads_100_by_tie_break() {
        // Both averages are zero; the avg_loss rule is checked first.
        let mut rsi = Rsi::new(4);
        feed(&mut rsi, std::iter::repeat(50.0).take(10));
        assert_eq!(rsi.value(), Some(100.0));
    }

    #[test]
    fn rsi_stays_in_range() {
        let mut rsi = Rsi::new(14);
        let prices = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.15, 43.61, 44.33, 44.83, 45.10,
            45.15, 44.34, 44.09, 44.50, 43.90,
        ];
        feed(&mut rsi, prices);
        let v = rsi.value().unwrap();
        assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
    }

    #[test]
    fn rsi_reset_clears_state() {
        let mut rsi = Rsi::new(3);
        feed(&mut rsi, [1.0, 2.0, 3.0, 4.0]);
        assert!(rsi.is_ready());
        rsi.reset();
        assert!(!rsi.is_ready());
        assert!(rsi.value().is_none());
    }
}
