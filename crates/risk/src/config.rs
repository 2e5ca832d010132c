use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use common::{Error, Result};

/// User-configurable risk parameters. Loaded once at startup and immutable
/// afterwards; per-market overrides are resolved through
/// `RiskEngine::market_limits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskConfig {
    /// Maximum size for any single position as a fraction of equity, (0, 1].
    pub max_position_size: f64,
    /// Maximum allowed leverage multiplier, >= 1.
    pub max_leverage: f64,
    /// Maximum allowable loss in a single trading day as a fraction of
    /// equity. The breaker currently takes its daily threshold from the
    /// strategy file's circuitBreaker section; this field is the risk-file
    /// override once the two are merged, and is not consumed yet.
    pub daily_loss_limit: f64,
    /// Maximum allowable loss in a calendar week as a fraction of equity.
    /// No check consumes this yet; it belongs to a weekly breaker window
    /// once PnL is tracked across days.
    pub weekly_loss_limit: f64,
    /// Minimum equity-to-deposits ratio before blocking new trades.
    /// Belongs to a deposit-tracking account check; not consumed yet.
    pub min_equity_ratio: f64,
    /// Additional safety buffer above venue maintenance margin
    /// requirements. Belongs to the leverage check once the venue reports
    /// maintenance margin separately; not consumed yet.
    pub maintenance_margin_buffer: f64,
    /// Minimum USD liquidity required in a market to allow trading.
    pub min_liquidity: f64,
    /// Cooling-off period in seconds after a significant loss. Belongs to
    /// a post-loss re-entry timer; not consumed yet.
    pub cooldown_after_loss: u64,
    /// Market-specific parameter adjustments.
    #[serde(default)]
    pub market_overrides: HashMap<String, MarketOverride>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverride {
    pub max_position_size: Option<f64>,
    pub max_leverage: Option<f64>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size: 0.1,
            max_leverage: 3.0,
            daily_loss_limit: 0.05,
            weekly_loss_limit: 0.15,
            min_equity_ratio: 0.1,
            maintenance_margin_buffer: 0.05,
            min_liquidity: 5_000.0,
            cooldown_after_loss: 300,
            market_overrides: HashMap::new(),
        }
    }
}

impl RiskConfig {
    /// Load a risk TOML file. A missing file falls back to the compiled-in
    /// defaults with a warning; a present but malformed or out-of-range
    /// file is fatal.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path, error = %e, "Risk config not readable — using defaults");
                return Ok(Self::default());
            }
        };

        let config: RiskConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse risk config '{path}': {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_position_size > 0.0 && self.max_position_size <= 1.0) {
            return Err(Error::Config("maxPositionSize must lie in (0, 1]".into()));
        }
        if self.max_leverage < 1.0 {
            return Err(Error::Config("maxLeverage must be >= 1".into()));
        }
        if self.daily_loss_limit <= 0.0 || self.weekly_loss_limit <= 0.0 {
            return Err(Error::Config("loss limits must be positive fractions".into()));
        }
        if !(0.0..=1.0).contains(&self.min_equity_ratio) {
            return Err(Error::Config("minEquityRatio must lie in [0, 1]".into()));
        }
        if self.maintenance_margin_buffer < 0.0 {
            return Err(Error::Config("maintenanceMarginBuffer must be >= 0".into()));
        }
        if self.min_liquidity < 0.0 {
            return Err(Error::Config("minLiquidity must be >= 0".into()));
        }
        for (market, ov) in &self.market_overrides {
            if let Some(size) = ov.max_position_size {
                if !(size > 0.0 && size <= 1.0) {
                    return Err(Error::Config(format!(
                        "override maxPositionSize for '{market}' must lie in (0, 1]"
                    )));
                }
            }
            if let Some(lev) = ov.max_leverage {
                if lev < 1.0 {
                    return Err(Error::Config(format!(
                        "override maxLeverage for '{market}' must be >= 1"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RiskConfig::default().validate().is_ok());
    }

    #[test]
    fn oversized_position_limit_rejected() {
        let cfg = RiskConfig {
            max_position_size: 1.2,
            ..RiskConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sub_unit_leverage_rejected() {
        let cfg = RiskConfig {
            max_leverage: 0.5,
            ..RiskConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_override_rejected() {
        let mut cfg = RiskConfig::default();
        cfg.market_overrides.insert(
            "SOL-PERP".into(),
            MarketOverride {
                max_position_size: Some(2.0),
                max_leverage: None,
            },
        );
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = RiskConfig::load_or_default(Some("/nonexistent/risk.toml")).unwrap();
        assert!((cfg.max_position_size - 0.1).abs() < 1e-12);
    }

    #[test]
    fn camel_case_toml_parses() {
        let toml_src = r#"
maxPositionSize = 0.2
maxLeverage = 5.0
dailyLossLimit = 0.05
weeklyLossLimit = 0.15
minEquityRatio = 0.1
maintenanceMarginBuffer = 0.05
minLiquidity = 10000.0
cooldownAfterLoss = 300

[marketOverrides."SOL-PERP"]
maxPositionSize = 0.05
"#;
        let cfg: RiskConfig = toml::from_str(toml_src).unwrap();
        assert!(cfg.validate().is_ok());
        assert!(cfg.market_overrides.contains_key("SOL-PERP"));
    }
}
