use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Strategy configuration file (TOML). Key names follow the external
/// contract consumed by reporting tooling, hence camelCase.
///
/// Example `config/strategy.toml`:
/// ```toml
/// strategy = "meanReversion"
/// pair = "SOL-PERP"
///
/// [entryRules.priceAboveMA]
/// period = 50
/// threshold = 1.0
///
/// [entryRules.rsiConditions]
/// period = 14
/// overbought = 70.0
/// oversold = 30.0
///
/// [risk]
/// maxPositionSize = 0.1
/// stopLoss = 0.05
///
/// [circuitBreaker]
/// maxDailyLoss = -0.05
/// maxDrawdown = -0.10
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConfig {
    /// Strategy identifier, e.g. "meanReversion".
    pub strategy: String,
    /// Market symbol, e.g. "SOL-PERP".
    pub pair: String,
    pub entry_rules: EntryRules,
    pub risk: RiskRules,
    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerRules>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRules {
    #[serde(rename = "priceAboveMA")]
    pub price_above_ma: MaRule,
    pub rsi_conditions: RsiRule,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaRule {
    pub period: usize,
    /// Multiplier on the SMA forming the entry boundary (1.0 = the SMA
    /// itself).
    pub threshold: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsiRule {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRules {
    /// Position size as a fraction of equity, in (0, 1].
    pub max_position_size: f64,
    /// Stop-loss distance as a fraction of entry, in [0, 1].
    pub stop_loss: f64,
}

/// Optional circuit-breaker thresholds; both are negative fractions.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerRules {
    pub max_daily_loss: f64,
    pub max_drawdown: f64,
}

impl StrategyConfig {
    /// Load and validate a strategy file. Any problem here is fatal at
    /// startup — the pipeline never runs on partially valid config.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read strategy config '{path}': {e}")))?;
        let config: StrategyConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse strategy config '{path}': {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.strategy.is_empty() {
            return Err(Error::Config("strategy id must not be empty".into()));
        }
        if self.pair.is_empty() {
            return Err(Error::Config("pair must not be empty".into()));
        }

        let ma = &self.entry_rules.price_above_ma;
        if ma.period == 0 {
            return Err(Error::Config("priceAboveMA.period must be positive".into()));
        }
        if ma.threshold <= 0.0 {
            return Err(Error::Config("priceAboveMA.threshold must be positive".into()));
        }

        let rsi = &self.entry_rules.rsi_conditions;
        if rsi.period < 2 {
            return Err(Error::Config("rsiConditions.period must be >= 2".into()));
        }
        if !(0.0..=100.0).contains(&rsi.oversold) || !(0.0..=100.0).contains(&rsi.overbought) {
            return Err(Error::Config(
                "rsiConditions thresholds must lie in [0, 100]".into(),
            ));
        }
        if rsi.oversold >= rsi.overbought {
            return Err(Error::Config(
                "rsiConditions.oversold must be below overbought".into(),
            ));
        }

        if !(self.risk.max_position_size > 0.0 && self.risk.max_position_size <= 1.0) {
            return Err(Error::Config(
                "risk.maxPositionSize must lie in (0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.risk.stop_loss) {
            return Err(Error::Config("risk.stopLoss must lie in [0, 1]".into()));
        }

        if let Some(cb) = &self.circuit_breaker {
            if cb.max_daily_loss >= 0.0 || cb.max_drawdown >= 0.0 {
                return Err(Error::Config(
                    "circuitBreaker thresholds must be negative fractions".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Minimal valid config for tests: SMA and RSI periods are the knobs the
/// warm-up and signal tests care about.
#[cfg(test)]
pub fn test_config(ma_period: usize, rsi_period: usize) -> StrategyConfig {
    StrategyConfig {
        strategy: "meanReversion".into(),
        pair: "SOL-PERP".into(),
        entry_rules: EntryRules {
            price_above_ma: MaRule {
                period: ma_period,
                threshold: 1.0,
            },
            rsi_conditions: RsiRule {
                period: rsi_period,
                overbought: 70.0,
                oversold: 30.0,
            },
        },
        risk: RiskRules {
            max_position_size: 0.1,
            stop_loss: 0.05,
        },
        circuit_breaker: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config_passes() {
        assert!(test_config(50, 14).validate().is_ok());
    }

    #[test]
    fn zero_ma_period_rejected() {
        let mut cfg = test_config(50, 14);
        cfg.entry_rules.price_above_ma.period = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn inverted_rsi_thresholds_rejected() {
        let mut cfg = test_config(50, 14);
        cfg.entry_rules.rsi_conditions.oversold = 80.0;
        cfg.entry_rules.rsi_conditions.overbought = 70.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn position_size_outside_unit_interval_rejected() {
        let mut cfg = test_config(50, 14);
        cfg.risk.max_position_size = 1.5;
        assert!(cfg.validate().is_err());
        cfg.risk.max_position_size = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn positive_breaker_threshold_rejected() {
        let mut cfg = test_config(50, 14);
        cfg.circuit_breaker = Some(CircuitBreakerRules {
            max_daily_loss: 0.05,
            max_drawdown: -0.10,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_round_trips_camel_case_keys() {
        let toml_src = r#"
strategy = "meanReversion"
pair = "SOL-PERP"

[entryRules.priceAboveMA]
period = 5
threshold = 1.0

[entryRules.rsiConditions]
period = 5
overbought = 70.0
oversold = 30.0

[risk]
maxPositionSize = 0.1
stopLoss = 0.05

[circuitBreaker]
maxDailyLoss = -0.05
maxDrawdown = -0.10
"#;
        let cfg: StrategyConfig = toml::from_str(toml_src).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.entry_rules.price_above_ma.period, 5);
        assert!(cfg.circuit_breaker.is_some());
    }
}
