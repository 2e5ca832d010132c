use tracing::info;

use common::{Candle, Error, Result};

/// Parse a JSON array of candles. The file contract is an ordered sequence
/// sorted ascending by timestamp; ordering and gaps are not validated here.
pub fn parse_candles(json: &str) -> Result<Vec<Candle>> {
    let candles: Vec<Candle> = serde_json::from_str(json)?;
    Ok(candles)
}

/// Load historical candles from a JSON file. An unreadable, unparseable or
/// empty file aborts the run — a backtest over nothing would only produce
/// misleading statistics.
pub fn load_candles(path: &str) -> Result<Vec<Candle>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::DataFile {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let candles = parse_candles(&content).map_err(|e| Error::DataFile {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    if candles.is_empty() {
        return Err(Error::DataFile {
            path: path.to_string(),
            reason: "file contains no candles".into(),
        });
    }
    info!(path, candles = candles.len(), "Historical data loaded");
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_candle_array() {
        let json = r#"[
            {"timestamp": 1700000000000, "open": 99.0, "high": 101.0,
             "low": 98.5, "close": 100.0, "volume": 1234.5, "timeframe": "1m"},
            {"timestamp": 1700000060000, "open": 100.0, "high": 100.5,
             "low": 99.0, "close": 99.5, "volume": 987.0, "timeframe": "1m"}
        ]"#;
        let candles = parse_candles(json).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, 1_700_000_000_000);
        assert!((candles[1].close - 99.5).abs() < 1e-12);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_candles("not json").is_err());
        assert!(parse_candles(r#"[{"timestamp": "oops"}]"#).is_err());
    }

    #[test]
    fn missing_file_is_a_data_error() {
        let err = load_candles("/nonexistent/candles.json").unwrap_err();
        assert!(matches!(err, Error::DataFile { .. }));
    }
}
