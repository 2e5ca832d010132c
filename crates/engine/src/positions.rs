use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use common::{Direction, ExecutionClient, OpenPosition, OrderRequest, Result};

/// Bounded retry for a single order submission: transient venue errors get
/// a fixed number of attempts with a fixed delay before surfacing.
const ORDER_MAX_ATTEMPTS: usize = 3;
const ORDER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Default slippage applied to the execution price of entry orders.
pub const DEFAULT_SLIPPAGE: f64 = 0.005;

/// The single source of truth for what is currently open.
///
/// State machine per market is NONE -> OPEN -> NONE; at most one position
/// exists per market, and the manager refuses to open a second one. Calls
/// for the same market must not interleave — the tick loop processes one
/// tick to completion before the next, which provides that exclusion.
pub struct PositionManager {
    client: Arc<dyn ExecutionClient>,
    positions: HashMap<String, OpenPosition>,
    slippage: f64,
}

impl PositionManager {
    pub fn new(client: Arc<dyn ExecutionClient>, slippage: f64) -> Self {
        Self {
            client,
            positions: HashMap::new(),
            slippage,
        }
    }

    /// Open a position of `size` base-asset units at the current mark price.
    ///
    /// Returns `Ok(false)` without side effects when a position is already
    /// open on the market or the size quantizes below the venue's order
    /// step. Venue failures (after the bounded retry) propagate with local
    /// state unchanged — no position is recorded for an unconfirmed order.
    pub async fn open_position(
        &mut self,
        market: &str,
        size: f64,
        direction: Direction,
        mark_price: f64,
    ) -> Result<bool> {
        if self.positions.contains_key(market) {
            warn!(market, "Position already open — refusing a second entry");
            return Ok(false);
        }

        let state = self.client.market_state(market).await?;

        // Quantize up to the venue's order-step granularity
        let step = state.min_order_step;
        let quantized = if step > 0.0 {
            (size / step).ceil() * step
        } else {
            size
        };
        if quantized <= 0.0 || quantized < step {
            warn!(
                market,
                size,
                step,
                "Computed order size below venue order step — skipping order"
            );
            return Ok(false);
        }

        // Execution price is the mark adjusted against the position
        let order_price = match direction {
            Direction::Long => mark_price * (1.0 + self.slippage),
            Direction::Short => mark_price * (1.0 - self.slippage),
        };

        let order = OrderRequest::limit_order(market, direction, quantized, order_price);
        let order_ref = self.submit_with_retry(&order).await?;

        self.positions.insert(
            market.to_string(),
            OpenPosition {
                market: market.to_string(),
                size: quantized,
                direction,
                entry_price: order_price,
                order_ref,
                opened_at: Utc::now(),
            },
        );
        info!(market, %direction, price = order_price, size = quantized, "Opened position");
        Ok(true)
    }

    /// Close the open position on `market` with an opposite-direction
    /// market order sized to exactly flatten it.
    ///
    /// Returns `Ok(false)` with no side effects when nothing is open.
    pub async fn close_position(&mut self, market: &str) -> Result<bool> {
        let Some(position) = self.positions.get(market) else {
            return Ok(false);
        };

        let order = OrderRequest::market_order(
            market,
            position.direction.opposite(),
            position.size,
        );
        self.submit_with_retry(&order).await?;

        let closed = self.positions.remove(market);
        if let Some(p) = closed {
            info!(market, direction = %p.direction, size = p.size, "Closed position");
        }
        Ok(true)
    }

    /// Read-only snapshot of all currently open positions, for health
    /// reporting.
    pub fn positions(&self) -> Vec<OpenPosition> {
        self.positions.values().cloned().collect()
    }

    pub fn has_position(&self, market: &str) -> bool {
        self.positions.contains_key(market)
    }

    async fn submit_with_retry(&self, order: &OrderRequest) -> Result<String> {
        let mut last_err = None;
        for attempt in 1..=ORDER_MAX_ATTEMPTS {
            match self.client.place_order(order).await {
                Ok(order_ref) => return Ok(order_ref),
                Err(e) => {
                    warn!(
                        market = %order.market,
                        attempt,
                        error = %e,
                        "Order submission failed"
                    );
                    last_err = Some(e);
                    if attempt < ORDER_MAX_ATTEMPTS {
                        tokio::time::sleep(ORDER_RETRY_DELAY).await;
                    }
                }
            }
        }
        let err = last_err.unwrap_or_else(|| {
            common::Error::Execution("order submission failed with no attempts".into())
        });
        error!(market = %order.market, error = %err, "Order submission exhausted retries");
        Err(err)
    }
}
