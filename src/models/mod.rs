//! Data models for the AQI forecast service
//!
//! This module contains the core domain models organized by concern:
//! - Pollutant: pollutant identifiers and daily series
//! - Location: geographic coordinates
//! - Forecast: prediction points and API response bodies

pub mod forecast;
pub mod location;
pub mod pollutant;

// Re-export all public types for convenient access
pub use forecast::{CurrentAqiResponse, ForecastPoint, ForecastResponse};
pub use location::Coordinates;
pub use pollutant::{Pollutant, PollutantReadings, PollutantSeries, round2};
