use super::Indicator;

/// Exponential moving average with smoothing constant `2 / (period + 1)`.
///
/// The first sample seeds the average; the indicator reports ready once
/// `period` samples have been seen.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    ema: Option<f64>,
    count: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            ema: None,
            count: 0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Ema {
    fn update(&mut self, value: f64) {
        self.ema = Some(match self.ema {
            None => value,
            Some(prev) => (value - prev) * self.multiplier + prev,
        });
        self.count += 1;
    }

    fn is_ready(&self) -> bool {
        self.count >= self.period
    }

    fn value(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        self.ema
    }

    fn reset(&mut self) {
        self.ema = None;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seeds_with_first_sample() {
        let mut ema = Ema::new(1);
        ema.update(42.0);
        assert!(ema.is_ready());
        assert!((ema.value().unwrap() - 42.0).abs() < 1e-12);
    }

    #[test]
    fn ema_not_ready_until_period_samples() {
        let mut ema = Ema::new(3);
        ema.update(1.0);
        ema.update(2.0);
        assert!(!ema.is_ready());
        ema.update(3.0);
        assert!(ema.is_ready());
    }

    #[test]
    fn ema_applies_standard_smoothing() {
        // period 3 => alpha = 0.5
        let mut ema = Ema::new(3);
        ema.update(10.0);
        ema.update(20.0); // 10 + (20-10)*0.5 = 15
        ema.update(30.0); // 15 + (30-15)*0.5 = 22.5
        assert!((ema.value().unwrap() - 22.5).abs() < 1e-12);
    }

    #[test]
    fn ema_converges_toward_constant_input() {
        let mut ema = Ema::new(5);
        ema.update(0.0);
        for _ in 0..200 {
            ema.update(100.0);
        }
        assert!((ema.value().unwrap() - 100.0).abs() < 1e-6);
    }
}
