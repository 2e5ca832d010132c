pub mod breaker;
pub mod config;
pub mod engine;

pub use breaker::CircuitBreaker;
pub use config::{MarketOverride, RiskConfig};
pub use engine::RiskEngine;
