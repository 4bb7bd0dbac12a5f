mod common;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use btc_forecast::model::observations_from_prices;

use common::hourly_points;

fn random_walk(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 40_000.0;
    (0..n)
        .map(|_| {
            price += rng.gen_range(-150.0..150.0);
            price
        })
        .collect()
}

#[test]
/// Every raw series of length n >= 2 loses exactly its first and last point.
fn usable_length_is_raw_minus_two() {
    for n in 2..40 {
        let obs = observations_from_prices(&hourly_points(&random_walk(n, n as u64)));
        assert_eq!(obs.len(), n - 2, "n = {}", n);
    }
}

#[test]
/// High/low are the envelope of open and close, never anything else.
fn high_and_low_come_from_open_and_close() {
    let obs = observations_from_prices(&hourly_points(&random_walk(48, 11)));
    for o in &obs {
        assert!(o.high >= o.low);
        assert!(o.high == o.open || o.high == o.close);
        assert!(o.low == o.open || o.low == o.close);
        assert_eq!(o.close, o.price);
    }
}

#[test]
/// Each target is the following row's close, and each open the previous close.
fn targets_chain_to_next_close() {
    let obs = observations_from_prices(&hourly_points(&random_walk(30, 5)));
    for pair in obs.windows(2) {
        assert_eq!(pair[0].target, pair[1].close);
        assert_eq!(pair[1].open, pair[0].close);
    }
}

#[test]
fn order_follows_the_api() {
    let obs = observations_from_prices(&hourly_points(&random_walk(20, 3)));
    assert!(obs.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}
