use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use common::{
    Candle, Direction, EquityPoint, Error, Result, SignalDirection, Trade,
};
use risk::CircuitBreaker;
use strategy::config::StrategyConfig;
use strategy::{build_strategy, IndicatorEngine, MarketData, Strategy};

use crate::stats;

/// Simulation parameters for fills. Slippage is a fraction moved against
/// the position; the fee is proportional to filled notional.
#[derive(Debug, Clone, Copy)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub fee_rate: f64,
    pub slippage: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            fee_rate: 0.001,
            slippage: 0.005,
        }
    }
}

/// Full output of one backtest run. Field names are the external contract
/// consumed by reporting tooling, hence camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_fees: f64,
}

impl BacktestResult {
    /// Persist the result as pretty-printed JSON for the reporting tooling.
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path, "Backtest result saved");
        Ok(())
    }
}

struct SimPosition {
    direction: Direction,
    entry_price: f64,
    size: f64,
    entry_fee: f64,
}

impl SimPosition {
    /// Unrealized P&L marked at `price`, before fees.
    fn unrealized(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Long => (price - self.entry_price) * self.size,
            Direction::Short => (self.entry_price - price) * self.size,
        }
    }
}

/// Replays a candle sequence through the same signal pipeline the live bot
/// runs, with a simulated fill model in place of the execution venue.
///
/// Fully synchronous and single-threaded: the same candle sequence and
/// configuration always produce byte-identical output.
pub struct BacktestEngine {
    strategy: Box<dyn Strategy>,
    indicators: IndicatorEngine,
    breaker: CircuitBreaker,
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(strategy_config: &StrategyConfig, config: BacktestConfig) -> Result<Self> {
        let breaker = match strategy_config.circuit_breaker {
            Some(cb) => CircuitBreaker::new(cb.max_daily_loss, cb.max_drawdown),
            None => CircuitBreaker::default(),
        };
        Ok(Self {
            strategy: build_strategy(strategy_config)?,
            indicators: IndicatorEngine::from_config(strategy_config),
            breaker,
            config,
        })
    }

    pub fn run(&mut self, candles: &[Candle]) -> Result<BacktestResult> {
        if candles.is_empty() {
            return Err(Error::Other(
                "backtest requires at least one candle".into(),
            ));
        }
        info!(
            candles = candles.len(),
            capital = self.config.initial_capital,
            "Backtest starting"
        );

        let initial = self.config.initial_capital;
        let mut cash = initial;
        let mut realized_pnl = 0.0_f64;
        let mut peak = initial;
        let mut position: Option<SimPosition> = None;
        let mut trades: Vec<Trade> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(candles.len());
        let mut warming_up = false;

        for candle in candles {
            let price = candle.close;
            self.indicators.update(price);

            // Mark-to-market equity goes on the curve unconditionally,
            // warm-up included.
            let equity = cash + position.as_ref().map_or(0.0, |p| p.unrealized(price));
            equity_curve.push(EquityPoint {
                timestamp: candle.timestamp,
                equity,
            });

            if !self.indicators.is_ready() {
                if !warming_up {
                    debug!(timestamp = candle.timestamp, "Indicator warm-up started");
                    warming_up = true;
                }
                continue;
            }
            if warming_up {
                info!(timestamp = candle.timestamp, "Indicators warmed up — trading enabled");
                warming_up = false;
            }

            let snapshot = self.indicators.detailed();
            let signal = self.strategy.generate_signal(&MarketData::from_snapshot(
                price,
                candle.timestamp,
                snapshot,
            ));

            // Breaker inputs: realized losses since the start of the run and
            // the running drawdown of the marked equity curve.
            peak = peak.max(equity);
            let pnl_fraction = realized_pnl / initial;
            let drawdown = if peak > 0.0 { (equity - peak) / peak } else { 0.0 };
            let daily_ok = self.breaker.check_daily_pnl(pnl_fraction);
            let drawdown_ok = self.breaker.check_max_drawdown(drawdown);
            if !(daily_ok && drawdown_ok) {
                continue;
            }

            match signal.direction {
                SignalDirection::Long | SignalDirection::Short if position.is_none() => {
                    let direction = if signal.direction == SignalDirection::Long {
                        Direction::Long
                    } else {
                        Direction::Short
                    };
                    let size = equity * signal.size / price;
                    let fill = match direction {
                        Direction::Long => price * (1.0 + self.config.slippage),
                        Direction::Short => price * (1.0 - self.config.slippage),
                    };
                    let fee = fill * size * self.config.fee_rate;
                    if cash < fee {
                        warn!(
                            timestamp = candle.timestamp,
                            cash,
                            fee,
                            "Insufficient cash for entry fee — trade skipped"
                        );
                        continue;
                    }
                    cash -= fee;
                    trades.push(Trade {
                        timestamp: candle.timestamp,
                        direction: signal.direction,
                        price: fill,
                        size,
                        fee,
                        pnl: None,
                    });
                    position = Some(SimPosition {
                        direction,
                        entry_price: fill,
                        size,
                        entry_fee: fee,
                    });
                    debug!(
                        timestamp = candle.timestamp,
                        %direction,
                        fill,
                        size,
                        reason = %signal.reason,
                        "Simulated entry"
                    );
                }
                SignalDirection::Close => {
                    if let Some(pos) = position.take() {
                        let fill = match pos.direction {
                            Direction::Long => price * (1.0 - self.config.slippage),
                            Direction::Short => price * (1.0 + self.config.slippage),
                        };
                        let exit_fee = fill * pos.size * self.config.fee_rate;
                        let gross = pos.unrealized(fill);
                        let pnl = gross - pos.entry_fee - exit_fee;
                        cash += gross - exit_fee;
                        realized_pnl += pnl;
                        trades.push(Trade {
                            timestamp: candle.timestamp,
                            direction: SignalDirection::Close,
                            price: fill,
                            size: pos.size,
                            fee: exit_fee,
                            pnl: Some(pnl),
                        });
                        debug!(
                            timestamp = candle.timestamp,
                            fill,
                            pnl,
                            reason = %signal.reason,
                            "Simulated exit"
                        );
                    }
                }
                _ => {}
            }
        }

        // Force-close whatever is still open at the final close so the run
        // ends flat. No slippage or fee on this synthetic exit.
        if let Some(pos) = position.take() {
            let last = &candles[candles.len() - 1];
            let gross = pos.unrealized(last.close);
            let pnl = gross - pos.entry_fee;
            cash += gross;
            trades.push(Trade {
                timestamp: last.timestamp,
                direction: SignalDirection::Close,
                price: last.close,
                size: pos.size,
                fee: 0.0,
                pnl: Some(pnl),
            });
            info!(price = last.close, pnl, "Force-closed open position at end of data");
        }

        let result = BacktestResult {
            initial_capital: initial,
            final_capital: cash,
            sharpe_ratio: stats::sharpe_ratio(&equity_curve),
            max_drawdown: stats::max_drawdown(&equity_curve),
            win_rate: stats::win_rate(&trades),
            profit_factor: stats::profit_factor(&trades),
            total_fees: stats::total_fees(&trades),
            equity_curve,
            trades,
        };
        info!(
            final_capital = result.final_capital,
            trades = result.trades.len(),
            sharpe = result.sharpe_ratio,
            max_drawdown = result.max_drawdown,
            "Backtest finished"
        );
        Ok(result)
    }
}
