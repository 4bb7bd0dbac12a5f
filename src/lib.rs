pub mod cache;
pub mod coingecko;
pub mod config;
pub mod error;
pub mod model;
pub mod predictor;
pub mod server;
pub mod ui;
