mod common;

use btc_forecast::error::{
    FetchError, ForecastError, Severity, FETCH_FAILED_MESSAGE, TOO_LITTLE_TRAINING_DATA_MESSAGE,
};
use btc_forecast::model::observations_from_prices;
use btc_forecast::predictor::{
    check_training_rows, Forecaster, MIN_RAW_POINTS, MIN_TRAINING_ROWS_EXCLUSIVE,
};

use common::{hourly_points, increasing_prices};

#[test]
/// 24 strictly increasing hourly prices: 22 usable rows, finite R² and forecast.
fn day_of_rising_prices_trains_and_predicts() {
    let points = hourly_points(&increasing_prices(24));
    let forecast = Forecaster::default().run(Ok(points.as_slice())).unwrap();

    assert_eq!(forecast.observations.len(), 22);
    assert_eq!(forecast.train_rows + forecast.test_rows, 22);
    assert_eq!(forecast.test_rows, 5);
    assert!(forecast.r2.is_finite());
    assert!(forecast.next_close.is_finite());
    // A perfectly linear climb is fitted exactly, so the most recent row's
    // features map onto its own target.
    let last = forecast.observations.last().unwrap();
    assert!((forecast.next_close - last.target).abs() < 1e-3);
    assert!((forecast.r2 - 1.0).abs() < 1e-6);
}

#[test]
/// Three raw points stop at the raw-data guard with the generic message.
fn three_points_is_insufficient_raw_data() {
    let points = hourly_points(&[1.0, 2.0, 3.0]);
    let err = Forecaster::default()
        .run(Ok(points.as_slice()))
        .unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientRawData {
            got: 3,
            required: MIN_RAW_POINTS
        }
    ));
    assert_eq!(err.severity(), Severity::Error);
    assert_eq!(err.user_message(), FETCH_FAILED_MESSAGE);
}

#[test]
fn nine_points_is_still_too_few() {
    let points = hourly_points(&increasing_prices(9));
    let err = Forecaster::default()
        .run(Ok(points.as_slice()))
        .unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientRawData { got: 9, .. }));
}

#[test]
/// Twelve raw points give ten usable rows, which is enough to train.
fn twelve_points_produce_a_prediction() {
    let prices = [
        42_000.0, 42_150.0, 41_980.0, 42_300.0, 42_410.0, 42_200.0, 42_050.0, 42_500.0, 42_620.0,
        42_580.0, 42_700.0, 42_640.0,
    ];
    let points = hourly_points(&prices);
    let forecast = Forecaster::default().run(Ok(points.as_slice())).unwrap();
    assert_eq!(forecast.observations.len(), 10);
    assert_eq!(forecast.test_rows, 2);
    assert_eq!(forecast.train_rows, 8);
    assert!(forecast.next_close.is_finite());
    assert!(forecast.r2.is_finite());
}

#[test]
/// A failed fetch halts before any transform with the generic message.
fn fetch_failure_halts_with_generic_message() {
    let err = Forecaster::default()
        .run(Err(FetchError::Status {
            status: 503,
            body: "unavailable".to_string(),
        }))
        .unwrap_err();
    assert!(matches!(err, ForecastError::Fetch(_)));
    assert_eq!(err.user_message(), FETCH_FAILED_MESSAGE);
}

#[test]
/// Six or fewer usable rows are refused with the training warning.
fn six_usable_rows_is_a_training_warning() {
    let obs = observations_from_prices(&hourly_points(&increasing_prices(8)));
    assert_eq!(obs.len(), MIN_TRAINING_ROWS_EXCLUSIVE);
    let err = check_training_rows(&obs).unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientTrainingData { usable: 6, .. }
    ));
    assert_eq!(err.severity(), Severity::Warning);
    assert_eq!(err.user_message(), TOO_LITTLE_TRAINING_DATA_MESSAGE);

    let enough = observations_from_prices(&hourly_points(&increasing_prices(9)));
    assert!(check_training_rows(&enough).is_ok());
}

#[test]
/// Any usable sequence past the guards yields a finite forecast.
fn forecast_is_always_finite_for_valid_input() {
    for n in MIN_RAW_POINTS..40 {
        let prices: Vec<f64> = (0..n)
            .map(|i| 30_000.0 + ((i * 37) % 11) as f64 * 13.5 - i as f64)
            .collect();
        let points = hourly_points(&prices);
        for seed in 0..4 {
            let forecast = Forecaster::new(0.2, Some(seed))
                .run(Ok(points.as_slice()))
                .unwrap();
            assert!(forecast.next_close.is_finite(), "n = {}", n);
            assert!(forecast.r2.is_finite(), "n = {}", n);
        }
    }
}

#[test]
fn flat_prices_still_forecast_the_flat_price() {
    let points = hourly_points(&[50_000.0; 12]);
    let forecast = Forecaster::default().run(Ok(points.as_slice())).unwrap();
    assert!((forecast.next_close - 50_000.0).abs() < 1e-6);
    assert!((forecast.r2 - 1.0).abs() < f64::EPSILON);
}
