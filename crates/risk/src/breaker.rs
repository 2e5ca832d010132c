use tracing::{info, warn};

/// Global trading halt on breached loss or drawdown thresholds, independent
/// of per-trade risk checks.
///
/// Both thresholds are negative fractions (e.g. -0.05 = a 5% loss). The
/// verdict is recomputed fresh from the latest reading on every call — there
/// is no latched trip state, so a recovered metric re-enables trading within
/// the same day. Only the trip/recover transitions are logged, to avoid
/// emitting on every tick.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    max_daily_loss: f64,
    max_drawdown: f64,
    daily_tripped: bool,
    drawdown_tripped: bool,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(-0.05, -0.10)
    }
}

impl CircuitBreaker {
    pub fn new(max_daily_loss: f64, max_drawdown: f64) -> Self {
        Self {
            max_daily_loss,
            max_drawdown,
            daily_tripped: false,
            drawdown_tripped: false,
        }
    }

    /// True when trading is allowed: the day's PnL fraction must stay
    /// strictly above the loss limit (the boundary itself trips).
    pub fn check_daily_pnl(&mut self, pnl: f64) -> bool {
        let tripped = pnl <= self.max_daily_loss;
        if tripped != self.daily_tripped {
            if tripped {
                warn!(pnl, limit = self.max_daily_loss, "Daily PnL limit breached — trading halted");
            } else {
                info!(pnl, "Daily PnL recovered — circuit breaker cleared");
            }
            self.daily_tripped = tripped;
        }
        !tripped
    }

    /// True when trading is allowed: drawdown (a negative fraction from the
    /// equity peak) must stay strictly above the limit.
    pub fn check_max_drawdown(&mut self, drawdown: f64) -> bool {
        let tripped = drawdown <= self.max_drawdown;
        if tripped != self.drawdown_tripped {
            if tripped {
                warn!(
                    drawdown,
                    limit = self.max_drawdown,
                    "Max drawdown limit breached — trading halted"
                );
            } else {
                info!(drawdown, "Drawdown recovered — circuit breaker cleared");
            }
            self.drawdown_tripped = tripped;
        }
        !tripped
    }

    /// Clear transition-tracking state. Intended to run once per trading day.
    pub fn reset(&mut self) {
        self.daily_tripped = false;
        self.drawdown_tripped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pnl_above_limit_allows_trading() {
        let mut cb = CircuitBreaker::new(-0.05, -0.10);
        assert!(cb.check_daily_pnl(0.02));
        assert!(cb.check_daily_pnl(-0.049));
    }

    #[test]
    fn pnl_boundary_trips() {
        let mut cb = CircuitBreaker::new(-0.05, -0.10);
        assert!(!cb.check_daily_pnl(-0.05), "boundary must be excluded from the ok side");
        assert!(!cb.check_daily_pnl(-0.06));
    }

    #[test]
    fn verdict_recomputed_each_call_not_latched() {
        let mut cb = CircuitBreaker::new(-0.05, -0.10);
        assert!(!cb.check_daily_pnl(-0.08));
        // A favorable reading un-trips without an explicit reset
        assert!(cb.check_daily_pnl(-0.01));
        assert!(!cb.check_daily_pnl(-0.07));
    }

    #[test]
    fn drawdown_check_is_independent_of_pnl_check() {
        let mut cb = CircuitBreaker::new(-0.05, -0.10);
        assert!(!cb.check_daily_pnl(-0.09));
        assert!(cb.check_max_drawdown(-0.04));
        assert!(!cb.check_max_drawdown(-0.11));
    }

    #[test]
    fn monotone_over_threshold_sweep() {
        let mut cb = CircuitBreaker::new(-0.05, -0.10);
        for i in -100..=100 {
            let pnl = i as f64 / 1000.0;
            let ok = cb.check_daily_pnl(pnl);
            assert_eq!(ok, pnl > -0.05, "wrong verdict at pnl = {pnl}");
        }
    }

    #[test]
    fn reset_clears_transition_state() {
        let mut cb = CircuitBreaker::new(-0.05, -0.10);
        assert!(!cb.check_daily_pnl(-0.08));
        cb.reset();
        // Fresh day: same reading trips again (and would re-log)
        assert!(!cb.check_daily_pnl(-0.08));
        assert!(cb.check_daily_pnl(0.0));
    }
}
