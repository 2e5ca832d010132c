pub mod bot;
pub mod positions;

pub use bot::TradingBot;
pub use positions::PositionManager;
