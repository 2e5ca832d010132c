/// How the process runs: a historical backtest, or a paper replay that
/// drives the live tick pipeline against the simulated venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Backtest,
    Paper,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Backtest => write!(f, "backtest"),
            Mode::Paper => write!(f, "paper"),
        }
    }
}

/// All process configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,

    /// Strategy TOML file.
    pub strategy_config_path: String,
    /// Optional risk TOML file; compiled-in defaults are used when absent.
    pub risk_config_path: Option<String>,

    /// Historical candle JSON file (both modes replay from file).
    pub historical_data_path: String,
    /// Where the backtest result JSON is written.
    pub result_path: String,

    pub initial_capital: f64,
    /// Paper-fill slippage in basis points.
    pub paper_slippage_bps: f64,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let mode = match required_env("BOT_MODE").to_lowercase().as_str() {
            "backtest" => Mode::Backtest,
            "paper" => Mode::Paper,
            other => panic!("ERROR: BOT_MODE must be 'backtest' or 'paper', got: '{other}'"),
        };

        Config {
            mode,
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategy.toml".to_string()),
            risk_config_path: optional_env("RISK_CONFIG_PATH"),
            historical_data_path: required_env("HISTORICAL_DATA_PATH"),
            result_path: optional_env("RESULT_PATH")
                .unwrap_or_else(|| "backtest_result.json".to_string()),
            initial_capital: optional_env("INITIAL_CAPITAL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000.0),
            paper_slippage_bps: optional_env("PAPER_SLIPPAGE_BPS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10.0),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
