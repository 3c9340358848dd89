//! Forecast results returned by the HTTP API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::pollutant::{Pollutant, PollutantReadings, PollutantSeries};

/// Predicted AQI for one future day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Calendar date of the prediction (`YYYY-MM-DD`)
    pub date: NaiveDate,
    /// Ordinal label, "Day 1" for tomorrow
    pub day: String,
    #[serde(rename = "predicted_AQI")]
    pub predicted_aqi: f64,
}

/// Body of `GET /forecast`
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    pub city: String,
    /// Most recent daily average per pollutant
    pub pollutants: PollutantReadings,
    /// Trailing daily averages per pollutant, oldest first
    pub pollutants_history: PollutantSeries,
    pub predictions: Vec<ForecastPoint>,
    pub note: &'static str,
}

/// Body of `GET /aqi/current`
#[derive(Debug, Clone, Serialize)]
pub struct CurrentAqiResponse {
    pub city: String,
    pub pollutants: PollutantReadings,
    /// Overall index, `None` when no pollutant falls inside a breakpoint band
    pub aqi: Option<f64>,
    pub dominant_pollutant: Option<Pollutant>,
    pub sub_indices: BTreeMap<Pollutant, f64>,
}
