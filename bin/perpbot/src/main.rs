use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::EnvFilter;

use backtest::{load_candles, BacktestConfig, BacktestEngine};
use common::{Candle, Config, ExecutionClient, Mode, PriceTick};
use engine::TradingBot;
use paper::PaperClient;
use risk::RiskConfig;
use strategy::StrategyConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(mode = %cfg.mode, "PerpBot starting");

    let strategy_cfg = StrategyConfig::load(&cfg.strategy_config_path)
        .context("loading strategy configuration")?;
    let candles =
        load_candles(&cfg.historical_data_path).context("loading historical candles")?;

    match cfg.mode {
        Mode::Backtest => run_backtest(&cfg, &strategy_cfg, &candles),
        Mode::Paper => run_paper(&cfg, &strategy_cfg, &candles).await,
    }
}

fn run_backtest(
    cfg: &Config,
    strategy_cfg: &StrategyConfig,
    candles: &[Candle],
) -> anyhow::Result<()> {
    let backtest_cfg = BacktestConfig {
        initial_capital: cfg.initial_capital,
        ..BacktestConfig::default()
    };
    let mut engine = BacktestEngine::new(strategy_cfg, backtest_cfg)?;
    let result = engine.run(candles)?;
    result.save(&cfg.result_path)?;
    info!(
        final_capital = result.final_capital,
        trades = result.trades.len(),
        win_rate = result.win_rate,
        sharpe = result.sharpe_ratio,
        result_path = %cfg.result_path,
        "Backtest complete"
    );
    Ok(())
}

/// Replay the candle file through the live tick pipeline with the simulated
/// venue standing in for the exchange.
async fn run_paper(
    cfg: &Config,
    strategy_cfg: &StrategyConfig,
    candles: &[Candle],
) -> anyhow::Result<()> {
    let risk_cfg = RiskConfig::load_or_default(cfg.risk_config_path.as_deref())?;
    let client = Arc::new(PaperClient::new(cfg.initial_capital, cfg.paper_slippage_bps));
    let bot = TradingBot::new(strategy_cfg, risk_cfg, client.clone())?;

    // ── Channels ──────────────────────────────────────────────────────────────
    // Single tick producer, single consumer; the bot drains one tick to
    // completion before the next is handed over.
    let (tick_tx, tick_rx) = mpsc::channel::<PriceTick>(1024);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received — requesting graceful stop");
            let _ = shutdown_tx.send(true);
        }
    });

    let bot_task = tokio::spawn(bot.run(tick_rx, shutdown_rx));

    // ── Replay ────────────────────────────────────────────────────────────────
    let pair = strategy_cfg.pair.clone();
    for candle in candles {
        client.update_price(&pair, candle.close).await;
        if tick_tx.send(PriceTick::from(candle)).await.is_err() {
            break;
        }
    }
    drop(tick_tx);

    bot_task.await.context("trading bot task failed")?;

    let equity = client.account_equity().await?;
    info!(
        equity,
        initial = cfg.initial_capital,
        "Paper replay finished"
    );
    Ok(())
}
