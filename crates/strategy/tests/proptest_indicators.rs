use proptest::collection::vec;
use proptest::prelude::*;

use strategy::indicators::{BollingerBands, Ema, Indicator, Rsi, Sma};

proptest! {
    /// RSI must stay inside [0, 100] for any finite positive price path.
    #[test]
    fn rsi_stays_within_bounds(
        prices in vec(0.01f64..1_000_000.0, 2..200),
        period in 2usize..30,
    ) {
        let mut rsi = Rsi::new(period);
        for p in &prices {
            rsi.update(*p);
        }
        if let Some(v) = rsi.value() {
            prop_assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
        }
    }

    /// The running-sum SMA must agree with a direct mean over the window,
    /// within floating-point drift.
    #[test]
    fn sma_matches_mean_of_last_window(
        prices in vec(1.0f64..10_000.0, 30..100),
        period in 1usize..20,
    ) {
        let mut sma = Sma::new(period);
        for p in &prices {
            sma.update(*p);
        }
        let expected =
            prices[prices.len() - period..].iter().sum::<f64>() / period as f64;
        let v = sma.value().unwrap();
        prop_assert!((v - expected).abs() < 1e-6 * expected.max(1.0));
    }

    /// Upper, middle and lower bands keep their ordering on any input.
    #[test]
    fn bollinger_bands_are_ordered(prices in vec(0.01f64..100_000.0, 25..100)) {
        let mut bb = BollingerBands::new(20, 2.0);
        for p in &prices {
            bb.update(*p);
        }
        let bands = bb.bands().unwrap();
        prop_assert!(bands.lower <= bands.middle);
        prop_assert!(bands.middle <= bands.upper);
    }

    /// An EMA is a convex combination of its inputs and can never leave the
    /// observed price range.
    #[test]
    fn ema_stays_within_observed_range(prices in vec(1.0f64..1_000.0, 5..100)) {
        let mut ema = Ema::new(5);
        for p in &prices {
            ema.update(*p);
        }
        let v = ema.value().unwrap();
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(v >= min - 1e-9 && v <= max + 1e-9);
    }
}
