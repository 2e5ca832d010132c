use tracing::{debug, info, warn};

use common::{SignalDirection, TradeSignal};

use crate::config::StrategyConfig;
use crate::{MarketData, Strategy};

/// Exit when RSI recovers above this level.
const TAKE_PROFIT_RSI: f64 = 50.0;
/// Exit when price falls below this fraction of the SMA.
const STOP_LOSS_MA_FRACTION: f64 = 0.95;

/// Mean-reversion signal generator: enter long when the market is oversold
/// and trading below its moving average, exit on RSI recovery or a hard
/// price stop.
///
/// Evaluation is a pure function of (price, indicator snapshot, config);
/// calling it twice with identical warmed-up inputs reproduces the identical
/// signal, which is what keeps the backtest equal to the live bot.
pub struct MeanReversionStrategy {
    config: StrategyConfig,
}

impl MeanReversionStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &str {
        "meanReversion"
    }

    fn market(&self) -> &str {
        &self.config.pair
    }

    fn generate_signal(&self, data: &MarketData) -> TradeSignal {
        let price = data.current_price;

        let (sma, rsi) = match (data.indicators.sma, data.indicators.rsi) {
            (Some(sma), Some(rsi)) => (sma, rsi.value),
            _ => {
                warn!(price, "Indicators missing in generate_signal");
                return TradeSignal::none("Missing indicator data");
            }
        };

        let rules = &self.config.entry_rules;
        let oversold = rsi < rules.rsi_conditions.oversold;
        let below_ma = price < sma * rules.price_above_ma.threshold;

        let stop_loss = price < sma * STOP_LOSS_MA_FRACTION;
        let take_profit = rsi > TAKE_PROFIT_RSI;

        debug!(price, sma, rsi, oversold, below_ma, stop_loss, take_profit, "Signal computation");

        if oversold && below_ma {
            info!(price, sma, rsi, "Entering LONG: oversold and price below MA");
            return TradeSignal {
                direction: SignalDirection::Long,
                size: self.config.risk.max_position_size,
                reason: "Oversold and below MA".into(),
            };
        }

        if take_profit || stop_loss {
            // Stop-loss wins the report when both fire on the same tick
            let reason = if stop_loss {
                "Stop loss triggered"
            } else {
                "Take profit reached"
            };
            info!(price, sma, rsi, reason, "Exiting position");
            return TradeSignal {
                direction: SignalDirection::Close,
                size: 0.0,
                reason: reason.into(),
            };
        }

        TradeSignal::none("No trade signal")
    }
}
