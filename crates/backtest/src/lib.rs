pub mod data;
pub mod engine;
pub mod stats;

pub use data::load_candles;
pub use engine::{BacktestConfig, BacktestEngine, BacktestResult};
