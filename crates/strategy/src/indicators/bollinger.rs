use crate::series::PriceSeries;

use super::{Indicator, Sma};

/// Bollinger Bands: middle band is an SMA over `period`, the outer bands sit
/// `multiplier` standard deviations away.
///
/// The deviation uses population variance (divisor `period`, not
/// `period - 1`) over the same window as the SMA. All three bands are
/// undefined until the window is full.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    multiplier: f64,
    window: PriceSeries,
    sma: Sma,
    bands: Option<Bands>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        assert!(multiplier > 0.0, "Bollinger multiplier must be > 0");
        Self {
            period,
            multiplier,
            window: PriceSeries::new(period),
            sma: Sma::new(period),
            bands: None,
        }
    }

    pub fn bands(&self) -> Option<Bands> {
        self.bands
    }
}

impl Indicator for BollingerBands {
    fn update(&mut self, value: f64) {
        self.window.push(value);
        self.sma.update(value);

        let Some(mean) = self.sma.value() else {
            self.bands = None;
            return;
        };

        let variance = self
            .window
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / self.period as f64;
        let std_dev = variance.sqrt();

        self.bands = Some(Bands {
            upper: mean + self.multiplier * std_dev,
            middle: mean,
            lower: mean - self.multiplier * std_dev,
        });
    }

    fn is_ready(&self) -> bool {
        self.bands.is_some()
    }

    fn value(&self) -> Option<f64> {
        self.bands.map(|b| b.middle)
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sma.reset();
        self.bands = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_undefined_until_window_full() {
        let mut bb = BollingerBands::new(4, 2.0);
        for p in [1.0, 2.0, 3.0] {
            bb.update(p);
            assert!(bb.bands().is_none());
        }
        bb.update(4.0);
        assert!(bb.bands().is_some());
    }

    #[test]
    fn bands_bracket_middle_symmetrically() {
        let mut bb = BollingerBands::new(5, 2.0);
        for p in [10.0, 12.0, 11.0, 13.0, 9.0, 14.0, 10.5] {
            bb.update(p);
        }
        let b = bb.bands().unwrap();
        assert!(b.upper >= b.middle);
        assert!(b.lower <= b.middle);
        let up = b.upper - b.middle;
        let down = b.middle - b.lower;
        assert!((up - down).abs() < 1e-9, "bands not symmetric: {up} vs {down}");
    }

    #[test]
    fn deviation_uses_population_variance() {
        // Window [1, 2, 3, 4]: mean 2.5, population variance 1.25
        let mut bb = BollingerBands::new(4, 1.0);
        for p in [1.0, 2.0, 3.0, 4.0] {
            bb.update(p);
        }
        let b = bb.bands().unwrap();
        let expected_std = 1.25_f64.sqrt();
        assert!((b.upper - (2.5 + expected_std)).abs() < 1e-12);
        assert!((b.lower - (2.5 - expected_std)).abs() < 1e-12);
    }

    #[test]
    fn constant_input_collapses_bands() {
        let mut bb = BollingerBands::new(3, 2.0);
        for _ in 0..5 {
            bb.update(7.0);
        }
        let b = bb.bands().unwrap();
        assert!((b.upper - 7.0).abs() < 1e-12);
        assert!((b.lower - 7.0).abs() < 1e-12);
    }
}
