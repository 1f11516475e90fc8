use indicators::{
    IndicatorSettings, Operation,
    series_math::{self, MacdParams},
    trend,
};
use price_series::{DateKey, DatedValue};
use proptest::prelude::*;

fn dated(values: &[f64]) -> Vec<DatedValue> {
    let newest = DateKey::new(20220615).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| DatedValue::new(newest.days_back(i as u32), *v))
        .collect()
}

proptest! {
    #[test]
    fn moving_averages_have_n_minus_length_plus_one_points(
        prices in proptest::collection::vec(1.0f64..1_000.0, 1..80),
        length in 1usize..30,
    ) {
        let data = dated(&prices);
        let expected = (prices.len() + 1).saturating_sub(length);
        prop_assert_eq!(series_math::ema(&data, Some(length)).unwrap().len(), expected);
        prop_assert_eq!(series_math::sma(&data, Some(length)).unwrap().len(), expected);
    }

    #[test]
    fn averages_stay_within_the_window(
        prices in proptest::collection::vec(1.0f64..1_000.0, 2..80),
        length in 2usize..20,
    ) {
        let data = dated(&prices);
        let lo = prices.iter().copied().fold(f64::INFINITY, f64::min) - 1e-9;
        let hi = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 1e-9;
        for v in series_math::ema(&data, Some(length)).unwrap() {
            prop_assert!(lo <= v.value && v.value <= hi);
        }
        for v in series_math::sma(&data, Some(length)).unwrap() {
            prop_assert!(lo <= v.value && v.value <= hi);
        }
    }

    #[test]
    fn rsi_is_a_percentage(prices in proptest::collection::vec(0.5f64..500.0, 2..40)) {
        let value = series_math::rsi(&dated(&prices), None).unwrap();
        prop_assert!((0.0..=100.0).contains(&value), "rsi {}", value);
    }

    #[test]
    fn trend_score_is_bounded(
        macd in proptest::collection::vec(-5.0f64..5.0, 5..60),
        seed in proptest::collection::vec(-5.0f64..5.0, 60),
    ) {
        let line = dated(&macd);
        let signal = dated(&seed[..macd.len()]);
        for op in [Operation::Buy, Operation::Sell] {
            let score = trend::trend_score(&line, &signal, op).unwrap();
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn macd_outputs_are_aligned(prices in proptest::collection::vec(1.0f64..100.0, 40..120)) {
        let m = series_math::macd(&dated(&prices), MacdParams::default()).unwrap();
        prop_assert_eq!(m.line.len(), m.signal.len());
        prop_assert_eq!(m.line.len(), prices.len() - 26 + 1 - 9 + 1);
    }
}

#[test]
fn default_settings_snapshot() {
    insta::assert_json_snapshot!(IndicatorSettings::default(), @r#"
    {
      "ema_length": 20,
      "sma_length": 50,
      "rsi_days": 15,
      "buy": {
        "short": 6,
        "long": 19,
        "signal": 9,
        "days": 60
      },
      "sell": {
        "short": 19,
        "long": 39,
        "signal": 9,
        "days": 80
      }
    }
    "#);
}
