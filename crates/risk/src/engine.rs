use std::sync::Arc;

use tracing::{debug, warn};

use common::ExecutionClient;

use crate::config::RiskConfig;

/// A new position may consume at most this fraction of the venue's
/// currently available liquidity. Compiled-in constant, not
/// user-configurable.
pub const MAX_LIQUIDITY_FRACTION: f64 = 0.10;

/// Per-market limits after applying overrides.
#[derive(Debug, Clone, Copy)]
pub struct MarketLimits {
    pub max_position_size: f64,
    pub max_leverage: f64,
}

/// Advisory per-trade gate, independent of the strategy. Three checks must
/// all pass before a position may be opened; any failure short-circuits the
/// rest with no side effects. The caller decides whether to resize, retry
/// or drop the trade.
pub struct RiskEngine {
    client: Arc<dyn ExecutionClient>,
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(client: Arc<dyn ExecutionClient>, config: RiskConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Resolve the effective limits for a market, applying any override.
    pub fn market_limits(&self, market: &str) -> MarketLimits {
        let ov = self.config.market_overrides.get(market);
        MarketLimits {
            max_position_size: ov
                .and_then(|o| o.max_position_size)
                .unwrap_or(self.config.max_position_size),
            max_leverage: ov
                .and_then(|o| o.max_leverage)
                .unwrap_or(self.config.max_leverage),
        }
    }

    /// Whether a position of `size_fraction` (fraction of `equity`) may be
    /// opened on `market`.
    ///
    /// Venue queries that fail close the gate: on doubt, skip the trade.
    pub async fn can_open_position(&self, market: &str, size_fraction: f64, equity: f64) -> bool {
        let limits = self.market_limits(market);

        // 1. Size check against the (possibly overridden) position cap
        if size_fraction > limits.max_position_size {
            warn!(
                market,
                size = size_fraction,
                max = limits.max_position_size,
                "Risk check failed: position size above cap"
            );
            return false;
        }

        let state = match self.client.market_state(market).await {
            Ok(state) => state,
            Err(e) => {
                warn!(market, error = %e, "Risk check failed: market state unavailable");
                return false;
            }
        };

        // 2. Liquidity check: floor on venue liquidity, then a cap on how
        //    much of it this trade may take
        let notional = size_fraction * equity;
        if state.available_liquidity < self.config.min_liquidity {
            warn!(
                market,
                liquidity = state.available_liquidity,
                min = self.config.min_liquidity,
                "Risk check failed: market below minimum liquidity"
            );
            return false;
        }
        if notional > state.available_liquidity * MAX_LIQUIDITY_FRACTION {
            warn!(
                market,
                notional,
                liquidity = state.available_liquidity,
                "Risk check failed: size exceeds liquidity fraction"
            );
            return false;
        }

        // 3. Margin check: projected leverage must stay below the cap
        if state.margin_ratio <= 0.0 {
            warn!(market, margin_ratio = state.margin_ratio, "Risk check failed: bad margin ratio");
            return false;
        }
        let projected_leverage = 1.0 / state.margin_ratio;
        if projected_leverage >= limits.max_leverage {
            warn!(
                market,
                projected_leverage,
                max = limits.max_leverage,
                "Risk check failed: leverage above cap"
            );
            return false;
        }

        debug!(market, size = size_fraction, notional, "Risk checks passed");
        true
    }
}
