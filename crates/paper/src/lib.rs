use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{
    Direction, Error, ExecutionClient, MarketState, OrderRequest, OrderType, PositionState, Result,
};

/// Simulated execution venue for paper replay and tests.
///
/// Fills are simulated at the limit price when one is given, otherwise at
/// the latest known mark price with configurable slippage. Realized PnL of
/// closed positions feeds back into the simulated equity. No real venue is
/// ever contacted.
pub struct PaperClient {
    equity: Arc<RwLock<f64>>,
    /// One simulated position per market at most.
    positions: Arc<RwLock<HashMap<String, PositionState>>>,
    /// Latest known mark price per market, fed by the replay loop.
    prices: Arc<RwLock<HashMap<String, f64>>>,
    /// Slippage in basis points applied to market-order fills.
    slippage_bps: f64,
    /// Fixed venue parameters reported for every market.
    market: MarketState,
}

impl PaperClient {
    pub fn new(initial_equity: f64, slippage_bps: f64) -> Self {
        info!(equity = initial_equity, slippage_bps, "PaperClient initialized");
        Self {
            equity: Arc::new(RwLock::new(initial_equity)),
            positions: Arc::new(RwLock::new(HashMap::new())),
            prices: Arc::new(RwLock::new(HashMap::new())),
            slippage_bps,
            market: MarketState {
                min_order_step: 0.01,
                available_liquidity: 1_000_000.0,
                margin_ratio: 0.5,
            },
        }
    }

    /// Override the venue parameters reported by `market_state`.
    pub fn with_market_state(mut self, market: MarketState) -> Self {
        self.market = market;
        self
    }

    /// Update the latest mark price for a market (called by the replay loop).
    pub async fn update_price(&self, market: &str, price: f64) {
        self.prices.write().await.insert(market.to_string(), price);
    }

    async fn fill_price(&self, order: &OrderRequest) -> Result<f64> {
        if let (OrderType::Limit, Some(price)) = (order.order_type, order.price) {
            return Ok(price);
        }
        let prices = self.prices.read().await;
        let mid = prices.get(&order.market).copied().ok_or_else(|| {
            Error::Execution(format!(
                "PaperClient has no price for market '{}'. Ensure ticks are flowing.",
                order.market
            ))
        })?;
        // Market orders: longs pay up, shorts receive less
        let slip = self.slippage_bps / 10_000.0;
        Ok(match order.direction {
            Direction::Long => mid * (1.0 + slip),
            Direction::Short => mid * (1.0 - slip),
        })
    }
}

#[async_trait]
impl ExecutionClient for PaperClient {
    async fn place_order(&self, order: &OrderRequest) -> Result<String> {
        let fill_price = self.fill_price(order).await?;

        debug!(
            market = %order.market,
            direction = %order.direction,
            fill = fill_price,
            size = order.size,
            "Paper fill simulated"
        );

        let mut positions = self.positions.write().await;
        match positions.get(&order.market).copied() {
            // Opposite-direction order against an open position closes it
            // and realizes its PnL into equity.
            Some(existing) if existing.direction == order.direction.opposite() => {
                let pnl = match existing.direction {
                    Direction::Long => (fill_price - existing.entry_price) * existing.size,
                    Direction::Short => (existing.entry_price - fill_price) * existing.size,
                };
                positions.remove(&order.market);
                let mut equity = self.equity.write().await;
                *equity += pnl;
                info!(market = %order.market, pnl, equity = *equity, "Paper position closed");
            }
            Some(_) => {
                return Err(Error::Execution(format!(
                    "paper position already open on '{}'",
                    order.market
                )));
            }
            None => {
                positions.insert(
                    order.market.clone(),
                    PositionState {
                        size: order.size,
                        direction: order.direction,
                        entry_price: fill_price,
                    },
                );
            }
        }

        Ok(order.id.clone())
    }

    async fn cancel_order(&self, _order_ref: &str) -> Result<()> {
        // Paper fills are immediate; there is never a resting order.
        Ok(())
    }

    async fn account_equity(&self) -> Result<f64> {
        Ok(*self.equity.read().await)
    }

    async fn position_state(&self, market: &str) -> Result<Option<PositionState>> {
        Ok(self.positions.read().await.get(market).copied())
    }

    async fn market_state(&self, _market: &str) -> Result<MarketState> {
        Ok(self.market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn market_long_fill_pays_positive_slippage() {
        let client = PaperClient::new(10_000.0, 10.0); // 10 bps
        client.update_price("SOL-PERP", 1000.0).await;

        let order = OrderRequest::market_order("SOL-PERP", Direction::Long, 1.0);
        client.place_order(&order).await.unwrap();

        let pos = client.position_state("SOL-PERP").await.unwrap().unwrap();
        let expected = 1000.0 * (1.0 + 10.0 / 10_000.0);
        assert!((pos.entry_price - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn limit_fill_uses_the_limit_price() {
        let client = PaperClient::new(10_000.0, 10.0);
        let order = OrderRequest::limit_order("SOL-PERP", Direction::Long, 1.0, 995.0);
        client.place_order(&order).await.unwrap();

        let pos = client.position_state("SOL-PERP").await.unwrap().unwrap();
        assert!((pos.entry_price - 995.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn opposite_order_closes_and_realizes_pnl() {
        let client = PaperClient::new(10_000.0, 0.0);
        let open = OrderRequest::limit_order("SOL-PERP", Direction::Long, 2.0, 100.0);
        client.place_order(&open).await.unwrap();

        client.update_price("SOL-PERP", 110.0).await;
        let close = OrderRequest::market_order("SOL-PERP", Direction::Short, 2.0);
        client.place_order(&close).await.unwrap();

        assert!(client.position_state("SOL-PERP").await.unwrap().is_none());
        // (110 - 100) * 2 = 20 realized
        assert!((client.account_equity().await.unwrap() - 10_020.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn same_direction_second_order_is_rejected() {
        let client = PaperClient::new(10_000.0, 0.0);
        let order = OrderRequest::limit_order("SOL-PERP", Direction::Long, 1.0, 100.0);
        client.place_order(&order).await.unwrap();
        assert!(client.place_order(&order).await.is_err());
    }

    #[tokio::test]
    async fn market_order_without_price_feed_fails() {
        let client = PaperClient::new(10_000.0, 0.0);
        let order = OrderRequest::market_order("SOL-PERP", Direction::Long, 1.0);
        assert!(client.place_order(&order).await.is_err());
    }
}
