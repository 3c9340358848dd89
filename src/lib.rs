//! `aqi-forecast` - Short-term air quality index forecasting
//!
//! This library provides the history fetchers, trend projection, model
//! invocation and HTTP surface of the AQI forecast service.

pub mod api;
pub mod aqi;
pub mod config;
pub mod error;
pub mod forecast;
pub mod history;
pub mod models;
pub mod regression;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::AqiConfig;
pub use error::AqiError;
pub use forecast::{AqiProjection, predict_future_aqi};
pub use history::{FetchOutcome, HistoryFetcher, HistorySource, HistoryWindow};
pub use models::{Coordinates, ForecastPoint, Pollutant, PollutantSeries};
pub use regression::{AqiModel, ModelError, RegressionModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AqiError>;
