use async_trait::async_trait;

use crate::{MarketState, OrderRequest, PositionState, Result};

/// Abstraction over the execution venue.
///
/// `PaperClient` implements this for simulation; a live venue connector
/// would implement it against the real exchange. Only `PositionManager`
/// in `crates/engine` submits orders through this trait — all order flow
/// passes the circuit-breaker and risk gates first.
///
/// Every call may fail with a transient venue error; callers retry with a
/// bound or surface the error, never swallow it.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Submit an order and return the venue's order reference.
    async fn place_order(&self, order: &OrderRequest) -> Result<String>;

    /// Cancel a previously placed order.
    async fn cancel_order(&self, order_ref: &str) -> Result<()>;

    /// Account equity: deposits minus withdrawals plus unrealized PnL.
    async fn account_equity(&self) -> Result<f64>;

    /// Venue-side position state for a market, `None` when flat.
    async fn position_state(&self, market: &str) -> Result<Option<PositionState>>;

    /// Current market parameters (order step, liquidity, margin ratio).
    async fn market_state(&self, market: &str) -> Result<MarketState>;
}
