use crate::series::PriceSeries;

use super::Indicator;

/// Simple moving average over a fixed window.
///
/// Keeps the last `period` values and a running sum; the value is undefined
/// until `period` samples have been seen.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: PriceSeries,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            window: PriceSeries::new(period),
            sum: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn update(&mut self, value: f64) {
        self.sum += value;
        if let Some(evicted) = self.window.push(value) {
            self.sum -= evicted;
        }
    }

    fn is_ready(&self) -> bool {
        self.window.is_full()
    }

    fn value(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        Some(self.sum / self.period as f64)
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }
}
