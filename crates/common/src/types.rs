use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV aggregate from the historical-data file.
/// Timestamps are epoch milliseconds, ascending file order is time order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timeframe: String,
}

/// A single price update from the market-data collaborator.
/// Only `mark_price` drives the decision pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PriceTick {
    pub mark_price: f64,
    pub timestamp: i64,
}

impl From<&Candle> for PriceTick {
    fn from(c: &Candle) -> Self {
        Self {
            mark_price: c.close,
            timestamp: c.timestamp,
        }
    }
}

/// Side of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// What a strategy asks the pipeline to do on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Long,
    Short,
    Close,
    None,
}

impl std::fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalDirection::Long => write!(f, "LONG"),
            SignalDirection::Short => write!(f, "SHORT"),
            SignalDirection::Close => write!(f, "CLOSE"),
            SignalDirection::None => write!(f, "NONE"),
        }
    }
}

/// Immutable output of a strategy evaluation.
/// `size` is a fraction of equity, not base-asset units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub direction: SignalDirection,
    pub size: f64,
    pub reason: String,
}

impl TradeSignal {
    pub fn none(reason: impl Into<String>) -> Self {
        Self {
            direction: SignalDirection::None,
            size: 0.0,
            reason: reason.into(),
        }
    }
}

/// Order type understood by the execution venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

/// An order handed to the execution collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub id: String,
    pub market: String,
    pub order_type: OrderType,
    pub direction: Direction,
    pub size: f64,
    /// `None` for market orders.
    pub price: Option<f64>,
}

impl OrderRequest {
    pub fn market_order(market: impl Into<String>, direction: Direction, size: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            market: market.into(),
            order_type: OrderType::Market,
            direction,
            size,
            price: None,
        }
    }

    pub fn limit_order(
        market: impl Into<String>,
        direction: Direction,
        size: f64,
        price: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            market: market.into(),
            order_type: OrderType::Limit,
            direction,
            size,
            price: Some(price),
        }
    }
}

/// A position currently open on a market, tracked by the PositionManager.
/// At most one of these exists per market at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub market: String,
    pub size: f64,
    pub direction: Direction,
    pub entry_price: f64,
    pub order_ref: String,
    pub opened_at: DateTime<Utc>,
}

/// Venue-reported position state, used for reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct PositionState {
    pub size: f64,
    pub direction: Direction,
    pub entry_price: f64,
}

/// Venue-reported market parameters consulted by risk checks and
/// order quantization.
#[derive(Debug, Clone, Copy)]
pub struct MarketState {
    /// Minimum order granularity in base-asset units.
    pub min_order_step: f64,
    /// USD liquidity currently available on the book.
    pub available_liquidity: f64,
    /// Current margin ratio; projected leverage is its reciprocal.
    pub margin_ratio: f64,
}

/// Append-only backtest ledger entry. `pnl` is set only on CLOSE trades and
/// is net of both entry and exit fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: i64,
    pub direction: SignalDirection,
    pub price: f64,
    pub size: f64,
    pub fee: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
}

/// One point of the backtest equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub equity: f64,
}
