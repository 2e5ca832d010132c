pub mod config;
pub mod engine;
pub mod indicators;
pub mod mean_reversion;
pub mod series;

pub use config::StrategyConfig;
pub use engine::{IndicatorEngine, IndicatorSnapshot};
pub use mean_reversion::MeanReversionStrategy;
pub use series::PriceSeries;

use common::{Error, Result, TradeSignal};
use engine::IndicatorSnapshot as Snapshot;

/// Everything a strategy is allowed to see on one tick.
///
/// The raw history arrays are intentionally passed empty by both the live
/// bot and the backtester: a strategy must depend only on the indicator
/// snapshot and the current price, so the two code paths stay identical.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub current_price: f64,
    pub closes: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub volumes: Vec<f64>,
    pub timestamp: i64,
    pub indicators: Snapshot,
}

impl MarketData {
    /// Build tick input from the current price and indicator snapshot,
    /// with empty history arrays.
    pub fn from_snapshot(current_price: f64, timestamp: i64, indicators: Snapshot) -> Self {
        Self {
            current_price,
            closes: Vec::new(),
            highs: Vec::new(),
            lows: Vec::new(),
            volumes: Vec::new(),
            timestamp,
            indicators,
        }
    }
}

/// All strategy implementations must satisfy this trait.
pub trait Strategy: Send + Sync {
    /// Strategy identifier shown in logs.
    fn name(&self) -> &str;

    /// The market this strategy trades (e.g. "SOL-PERP").
    fn market(&self) -> &str;

    /// Evaluate one tick and emit a trade signal.
    ///
    /// Must be a pure function of `data` and the strategy's configuration:
    /// identical warmed-up inputs must reproduce the identical signal, in
    /// live trading and in the backtest alike. Missing indicator values
    /// short-circuit to a NONE signal, never an error.
    fn generate_signal(&self, data: &MarketData) -> TradeSignal;
}

/// Build the configured strategy instance. Unknown strategy identifiers are
/// a construction-time error, not a silent fallback.
pub fn build_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy>> {
    match config.strategy.as_str() {
        "meanReversion" => Ok(Box::new(MeanReversionStrategy::new(config.clone()))),
        other => Err(Error::Config(format!("unknown strategy '{other}'"))),
    }
}
