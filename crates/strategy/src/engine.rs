use crate::config::StrategyConfig;
use crate::indicators::{BollingerBands, Ema, Indicator, Rsi, Sma};

/// Fixed EMA pair exposed in the snapshot as short/long with a crossover flag.
pub const EMA_SHORT_PERIOD: usize = 12;
pub const EMA_LONG_PERIOD: usize = 26;

/// Bollinger window used by the default indicator set.
pub const BOLLINGER_PERIOD: usize = 20;

/// RSI snapshot thresholds; these are fixed reporting bounds, distinct from
/// the strategy's configurable entry thresholds.
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Owns the closed set of indicators for one market and fans each new price
/// out to all of them.
///
/// Downstream components must not act before `is_ready()` — that is the
/// single warm-up gate for the whole pipeline.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    sma: Sma,
    ema_short: Ema,
    ema_long: Ema,
    rsi: Rsi,
    bollinger: BollingerBands,
}

/// Read-only value object produced fresh on every `detailed()` call.
/// Fields are `None` while the corresponding indicator is warming up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorSnapshot {
    pub sma: Option<f64>,
    pub rsi: Option<RsiSnapshot>,
    pub ema: Option<EmaSnapshot>,
    pub bollinger: Option<BollingerSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiSnapshot {
    pub value: f64,
    pub overbought: bool,
    pub oversold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaSnapshot {
    pub short: f64,
    pub long: f64,
    pub crossover: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerSnapshot {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl IndicatorEngine {
    /// Build the default indicator set from the strategy configuration:
    /// SMA and RSI periods come from the entry rules, the EMA pair and
    /// Bollinger window are fixed.
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            sma: Sma::new(config.entry_rules.price_above_ma.period),
            ema_short: Ema::new(EMA_SHORT_PERIOD),
            ema_long: Ema::new(EMA_LONG_PERIOD),
            rsi: Rsi::new(config.entry_rules.rsi_conditions.period),
            bollinger: BollingerBands::new(BOLLINGER_PERIOD, BollingerBands::DEFAULT_MULTIPLIER),
        }
    }

    /// Feed one price to every indicator. Cross-indicator order does not
    /// matter; indicators are independent of each other.
    pub fn update(&mut self, price: f64) {
        self.sma.update(price);
        self.ema_short.update(price);
        self.ema_long.update(price);
        self.rsi.update(price);
        self.bollinger.update(price);
    }

    /// True only when every indicator reports ready.
    pub fn is_ready(&self) -> bool {
        self.sma.is_ready()
            && self.ema_short.is_ready()
            && self.ema_long.is_ready()
            && self.rsi.is_ready()
            && self.bollinger.is_ready()
    }

    /// Consolidated snapshot of all indicator values.
    pub fn detailed(&self) -> IndicatorSnapshot {
        let rsi = self.rsi.value().map(|value| RsiSnapshot {
            value,
            overbought: value > RSI_OVERBOUGHT,
            oversold: value < RSI_OVERSOLD,
        });

        let ema = match (self.ema_short.value(), self.ema_long.value()) {
            (Some(short), Some(long)) => Some(EmaSnapshot {
                short,
                long,
                crossover: short > long,
            }),
            _ => None,
        };

        let bollinger = self.bollinger.bands().map(|b| BollingerSnapshot {
            upper: b.upper,
            middle: b.middle,
            lower: b.lower,
        });

        IndicatorSnapshot {
            sma: self.sma.value(),
            rsi,
            ema,
            bollinger,
        }
    }

    /// Clear all indicators (used between backtest runs).
    pub fn reset(&mut self) {
        self.sma.reset();
        self.ema_short.reset();
        self.ema_long.reset();
        self.rsi.reset();
        self.bollinger.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn engine_not_ready_until_slowest_indicator_is() {
        // SMA 5, RSI 5 (needs 6 samples), EMA 12/26, Bollinger 20.
        // The EMA long period dominates: ready from the 26th update.
        let mut engine = IndicatorEngine::from_config(&test_config(5, 5));
        for i in 0..25 {
            engine.update(100.0 + (i % 3) as f64);
            assert!(!engine.is_ready(), "ready too early at update {}", i + 1);
        }
        engine.update(101.0);
        assert!(engine.is_ready());
    }

    #[test]
    fn snapshot_fields_none_during_warmup() {
        let mut engine = IndicatorEngine::from_config(&test_config(5, 5));
        for p in [100.0, 101.0, 102.0] {
            engine.update(p);
        }
        let snap = engine.detailed();
        assert!(snap.sma.is_none());
        assert!(snap.rsi.is_none());
        assert!(snap.ema.is_none());
        assert!(snap.bollinger.is_none());
    }

    #[test]
    fn snapshot_flags_follow_values() {
        let mut engine = IndicatorEngine::from_config(&test_config(5, 5));
        // Strongly rising series: RSI pegs at 100, short EMA above long.
        for i in 0..40 {
            engine.update(100.0 + 2.0 * i as f64);
        }
        let snap = engine.detailed();
        let rsi = snap.rsi.unwrap();
        assert!(rsi.overbought);
        assert!(!rsi.oversold);
        let ema = snap.ema.unwrap();
        assert!(ema.crossover, "short EMA should lead in an uptrend");
        let bb = snap.bollinger.unwrap();
        assert!(bb.lower <= bb.middle && bb.middle <= bb.upper);
    }

    #[test]
    fn reset_returns_engine_to_cold_state() {
        let mut engine = IndicatorEngine::from_config(&test_config(5, 5));
        for i in 0..30 {
            engine.update(100.0 + i as f64);
        }
        assert!(engine.is_ready());
        engine.reset();
        assert!(!engine.is_ready());
        assert_eq!(engine.detailed(), IndicatorSnapshot::default());
    }
}
