use common::{EquityPoint, Trade};

/// Periods per year used to annualize the Sharpe ratio. Daily candles are
/// the canonical input, hence trading days.
const ANNUALIZATION_PERIODS: f64 = 252.0;

/// Annualized Sharpe ratio over period-to-period equity returns.
///
/// Mean return over population standard deviation, scaled by √252. Defined
/// as 0 with fewer than two equity points or a zero standard deviation.
pub fn sharpe_ratio(curve: &[EquityPoint]) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = curve
        .windows(2)
        .filter(|w| w[0].equity != 0.0)
        .map(|w| w[1].equity / w[0].equity - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return 0.0;
    }
    mean / std_dev * ANNUALIZATION_PERIODS.sqrt()
}

/// Maximum peak-to-trough fractional decline over the equity curve,
/// tracked with a running peak. Returned as a positive fraction.
pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for point in curve {
        peak = peak.max(point.equity);
        if peak > 0.0 {
            worst = worst.max((peak - point.equity) / peak);
        }
    }
    worst
}

/// Fraction of CLOSE trades with positive recorded P&L, 0 if there are none.
pub fn win_rate(trades: &[Trade]) -> f64 {
    let closes: Vec<&Trade> = trades.iter().filter(|t| t.pnl.is_some()).collect();
    if closes.is_empty() {
        return 0.0;
    }
    let wins = closes
        .iter()
        .filter(|t| t.pnl.is_some_and(|p| p > 0.0))
        .count();
    wins as f64 / closes.len() as f64
}

/// Gross profits over gross losses. +∞ when there are profits and no
/// losses, 0 when there are neither.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let mut profits = 0.0;
    let mut losses = 0.0;
    for pnl in trades.iter().filter_map(|t| t.pnl) {
        if pnl > 0.0 {
            profits += pnl;
        } else if pnl < 0.0 {
            losses += -pnl;
        }
    }
    if losses > 0.0 {
        profits / losses
    } else if profits > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Sum of the fee field across all recorded trades.
pub fn total_fees(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.fee).sum()
}
