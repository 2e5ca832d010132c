use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use common::{Direction, ExecutionClient, PriceTick, Result, SignalDirection};
use risk::{CircuitBreaker, RiskConfig, RiskEngine};
use strategy::config::StrategyConfig;
use strategy::{build_strategy, IndicatorEngine, MarketData, PriceSeries, Strategy};

use crate::positions::{PositionManager, DEFAULT_SLIPPAGE};

/// Rolling close-price window kept for health reporting.
const CLOSE_HISTORY: usize = 200;
/// Log a health line every this many processed ticks.
const HEALTH_LOG_INTERVAL: u64 = 300;

/// The live decision pipeline for one market.
///
/// One tick is processed to completion — indicator update, signal,
/// circuit-breaker and risk gates, position action — before the next tick
/// is read. That serialization is what keeps `PositionManager`'s
/// single-position invariant safe without locks: there is exactly one
/// consumer of the tick channel.
pub struct TradingBot {
    market: String,
    strategy: Box<dyn Strategy>,
    indicator_engine: IndicatorEngine,
    closes: PriceSeries,
    breaker: CircuitBreaker,
    risk: RiskEngine,
    positions: PositionManager,
    client: Arc<dyn ExecutionClient>,
    ready_logged: bool,
    warmup_logged: bool,
    ticks: u64,
}

impl TradingBot {
    pub fn new(
        strategy_config: &StrategyConfig,
        risk_config: RiskConfig,
        client: Arc<dyn ExecutionClient>,
    ) -> Result<Self> {
        let breaker = match strategy_config.circuit_breaker {
            Some(cb) => CircuitBreaker::new(cb.max_daily_loss, cb.max_drawdown),
            None => CircuitBreaker::default(),
        };

        Ok(Self {
            market: strategy_config.pair.clone(),
            strategy: build_strategy(strategy_config)?,
            indicator_engine: IndicatorEngine::from_config(strategy_config),
            closes: PriceSeries::new(CLOSE_HISTORY),
            breaker,
            risk: RiskEngine::new(client.clone(), risk_config),
            positions: PositionManager::new(client.clone(), DEFAULT_SLIPPAGE),
            client,
            ready_logged: false,
            warmup_logged: false,
            ticks: 0,
        })
    }

    /// Drive the pipeline until the tick source closes or a graceful-stop
    /// signal arrives.
    ///
    /// On stop: no new ticks are accepted, any in-flight call finishes, and
    /// open positions are left alone — closing them is an explicit operator
    /// action, never an automatic side effect of shutdown.
    pub async fn run(
        mut self,
        mut tick_rx: mpsc::Receiver<PriceTick>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!(market = %self.market, strategy = self.strategy.name(), "TradingBot running");
        loop {
            tokio::select! {
                tick = tick_rx.recv() => {
                    match tick {
                        Some(tick) => {
                            if let Err(e) = self.process_tick(tick).await {
                                // A single failed trade never halts the pipeline
                                error!(market = %self.market, error = %e, "Tick processing failed");
                            }
                        }
                        None => {
                            info!(market = %self.market, "Tick source closed — stopping");
                            break;
                        }
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!(market = %self.market, "Shutdown signal received — stopping");
                        break;
                    }
                }
            }
        }

        let open = self.positions.positions();
        if !open.is_empty() {
            warn!(
                market = %self.market,
                positions = open.len(),
                "Stopping with open positions — close them explicitly if desired"
            );
        }
    }

    /// Process exactly one price tick end to end.
    pub async fn process_tick(&mut self, tick: PriceTick) -> Result<()> {
        let price = tick.mark_price;
        self.indicator_engine.update(price);
        self.closes.push(price);
        self.ticks += 1;

        if !self.indicator_engine.is_ready() {
            if !self.warmup_logged {
                info!(market = %self.market, "Indicators warming up — no signals yet");
                self.warmup_logged = true;
            }
            return Ok(());
        }
        if !self.ready_logged {
            info!(market = %self.market, "Indicators ready — pipeline live");
            self.ready_logged = true;
        }

        if self.ticks % HEALTH_LOG_INTERVAL == 0 {
            self.log_health();
        }

        let equity = self.client.account_equity().await?;

        // Unrealized PnL of the venue-side position, as a fraction of equity,
        // feeds the daily circuit breaker.
        let pnl_fraction = match self.client.position_state(&self.market).await? {
            Some(pos) if equity > 0.0 => {
                let pnl = match pos.direction {
                    Direction::Long => (price - pos.entry_price) * pos.size,
                    Direction::Short => (pos.entry_price - price) * pos.size,
                };
                pnl / equity
            }
            _ => 0.0,
        };

        // Only the daily check runs live; the drawdown check needs the
        // full equity history, which only the backtester keeps.
        if !self.breaker.check_daily_pnl(pnl_fraction) {
            warn!(market = %self.market, pnl = pnl_fraction, "Circuit breaker open — skipping tick");
            return Ok(());
        }

        let snapshot = self.indicator_engine.detailed();
        let signal = self
            .strategy
            .generate_signal(&MarketData::from_snapshot(price, tick.timestamp, snapshot));

        match signal.direction {
            SignalDirection::Long | SignalDirection::Short => {
                let direction = if signal.direction == SignalDirection::Long {
                    Direction::Long
                } else {
                    Direction::Short
                };

                if !self.risk.can_open_position(&self.market, signal.size, equity).await {
                    warn!(market = %self.market, reason = %signal.reason, "Trade vetoed by risk engine");
                    return Ok(());
                }

                let size = equity * signal.size / price;
                self.positions
                    .open_position(&self.market, size, direction, price)
                    .await?;
            }
            SignalDirection::Close => {
                self.positions.close_position(&self.market).await?;
            }
            SignalDirection::None => {}
        }

        Ok(())
    }

    /// Read-only view used by health reporting and tests.
    pub fn open_positions(&self) -> Vec<common::OpenPosition> {
        self.positions.positions()
    }

    fn log_health(&self) {
        let open = self.positions.positions();
        info!(
            market = %self.market,
            ticks = self.ticks,
            open_positions = open.len(),
            last_close = self.closes.latest().unwrap_or(f64::NAN),
            "Bot health"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper::PaperClient;
    use strategy::config::{
        CircuitBreakerRules, EntryRules, MaRule, RiskRules, RsiRule, StrategyConfig,
    };

    fn config() -> StrategyConfig {
        StrategyConfig {
            strategy: "meanReversion".into(),
            pair: "SOL-PERP".into(),
            entry_rules: EntryRules {
                price_above_ma: MaRule {
                    period: 5,
                    threshold: 1.0,
                },
                rsi_conditions: RsiRule {
                    period: 5,
                    overbought: 70.0,
                    oversold: 30.0,
                },
            },
            risk: RiskRules {
                max_position_size: 0.1,
                stop_loss: 0.05,
            },
            circuit_breaker: Some(CircuitBreakerRules {
                max_daily_loss: -0.05,
                max_drawdown: -0.10,
            }),
        }
    }

    async fn feed(bot: &mut TradingBot, client: &PaperClient, prices: &[f64]) {
        for (i, &p) in prices.iter().enumerate() {
            client.update_price("SOL-PERP", p).await;
            bot.process_tick(PriceTick {
                mark_price: p,
                timestamp: i as i64 * 60_000,
            })
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn no_trades_during_warmup_or_flat_market() {
        let client = Arc::new(PaperClient::new(10_000.0, 0.0));
        let mut bot = TradingBot::new(&config(), RiskConfig::default(), client.clone()).unwrap();

        // 30 flat candles: warm-up completes, RSI reads 100 (flat tie-break),
        // the CLOSE exit path is a no-op with nothing open.
        feed(&mut bot, &client, &vec![100.0; 30]).await;
        assert!(bot.open_positions().is_empty());
    }

    #[tokio::test]
    async fn step_down_opens_long_and_recovery_closes_it() {
        let client = Arc::new(PaperClient::new(10_000.0, 0.0));
        let mut bot = TradingBot::new(&config(), RiskConfig::default(), client.clone()).unwrap();

        feed(&mut bot, &client, &vec![100.0; 30]).await;

        // Step down: RSI collapses toward 0, price sits below the falling SMA
        feed(&mut bot, &client, &vec![80.0; 5]).await;
        let open = bot.open_positions();
        assert_eq!(open.len(), 1, "oversold step-down must open a long");
        assert_eq!(open[0].direction, Direction::Long);

        // Recovery: RSI crosses back above 50 and the position closes
        feed(&mut bot, &client, &[88.0, 96.0, 100.0, 100.0, 100.0]).await;
        assert!(bot.open_positions().is_empty(), "RSI recovery must close the long");
    }

    #[tokio::test]
    async fn tripped_breaker_blocks_new_entries() {
        let client = Arc::new(PaperClient::new(10_000.0, 0.0));
        let mut bot = TradingBot::new(&config(), RiskConfig::default(), client.clone()).unwrap();

        feed(&mut bot, &client, &vec![100.0; 30]).await;

        // A venue-side long carrying a heavy unrealized loss: at 90 the
        // drawdown is (90 - 100) * 60 = -600, i.e. -6% of equity, past the
        // -5% daily limit.
        let seed = common::OrderRequest::limit_order("SOL-PERP", Direction::Long, 60.0, 100.0);
        client.place_order(&seed).await.unwrap();

        // The drop to 90 is exactly the oversold-and-below-MA setup that
        // would otherwise open a long; the breaker must skip these ticks.
        feed(&mut bot, &client, &vec![90.0; 5]).await;
        assert!(
            bot.open_positions().is_empty(),
            "no entry may go through while the daily-loss breaker is open"
        );
    }
}
