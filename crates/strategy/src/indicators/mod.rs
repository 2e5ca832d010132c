pub mod bollinger;
pub mod ema;
pub mod rsi;
pub mod sma;

pub use bollinger::BollingerBands;
pub use ema::Ema;
pub use rsi::Rsi;
pub use sma::Sma;

/// A streaming technical indicator: consumes one price at a time and keeps
/// just enough history to produce its next value.
///
/// Indicators never fail — insufficient history simply yields "not ready".
pub trait Indicator {
    /// Feed one new price.
    fn update(&mut self, value: f64);

    /// True once enough samples have been seen to produce a value.
    fn is_ready(&self) -> bool;

    /// Latest computed value, `None` during warm-up.
    fn value(&self) -> Option<f64>;

    /// Clear all internal state (used between backtest runs).
    fn reset(&mut self);
}
