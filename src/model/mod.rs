pub mod observation;

pub use observation::{observations_from_prices, Observation, PricePoint, FEATURE_DIM};
