//! Primary history source: Open-Meteo hourly air-quality API

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::daily::daily_averages;
use super::{FetchOutcome, HistorySource, HistoryWindow};
use crate::AqiError;
use crate::models::{Coordinates, Pollutant, PollutantSeries};

/// Client for the Open-Meteo air-quality endpoint
pub struct OpenMeteoAirQuality {
    /// HTTP client
    client: Client,
    /// Base URL, e.g. `https://air-quality-api.open-meteo.com/v1`
    base_url: String,
}

impl OpenMeteoAirQuality {
    pub fn new(base_url: String, timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aqi-forecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AqiError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request_url(&self, location: &Coordinates, window: &HistoryWindow) -> String {
        let hourly = Pollutant::ALL
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}/air-quality?latitude={}&longitude={}&start_date={}&end_date={}&hourly={}",
            self.base_url, location.latitude, location.longitude, window.start, window.end, hourly
        )
    }

    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    async fn fetch_daily_averages(
        &self,
        location: &Coordinates,
        window: &HistoryWindow,
    ) -> crate::Result<PollutantSeries> {
        let url = self.request_url(location, window);
        debug!("Open-Meteo air-quality request URL: {}", url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AqiError::api(format!("Open-Meteo request failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AqiError::api(format!(
                "Open-Meteo answered with status {status}"
            )));
        }

        let body: AirQualityResponse = response
            .json()
            .await
            .map_err(|e| AqiError::api(format!("Invalid Open-Meteo response: {e}")))?;
        let series = body.daily_averages(window.days)?;

        let total_duration = start_time.elapsed();
        info!(
            "Retrieved Open-Meteo pollutant history in {:.3}s",
            total_duration.as_secs_f64()
        );
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow Open-Meteo response: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(series)
    }
}

#[async_trait]
impl HistorySource for OpenMeteoAirQuality {
    fn name(&self) -> &str {
        "open-meteo"
    }

    async fn fetch(&self, location: &Coordinates, window: &HistoryWindow) -> FetchOutcome {
        self.fetch_daily_averages(location, window).await.into()
    }
}

/// Air-quality response body; only the hourly block is read
#[derive(Debug, Deserialize)]
pub struct AirQualityResponse {
    pub hourly: Option<HourlyAirQuality>,
}

/// Hourly pollutant series, any of which may be absent
#[derive(Debug, Default, Deserialize)]
pub struct HourlyAirQuality {
    pub pm10: Option<Vec<Option<f64>>>,
    pub pm2_5: Option<Vec<Option<f64>>>,
    pub carbon_monoxide: Option<Vec<Option<f64>>>,
    pub nitrogen_dioxide: Option<Vec<Option<f64>>>,
    pub sulphur_dioxide: Option<Vec<Option<f64>>>,
    pub ozone: Option<Vec<Option<f64>>>,
}

impl HourlyAirQuality {
    /// Hourly readings of one pollutant; a missing series reads as a single zero
    #[must_use]
    pub fn readings(&self, pollutant: Pollutant) -> Vec<Option<f64>> {
        let series = match pollutant {
            Pollutant::Pm10 => &self.pm10,
            Pollutant::Pm25 => &self.pm2_5,
            Pollutant::CarbonMonoxide => &self.carbon_monoxide,
            Pollutant::NitrogenDioxide => &self.nitrogen_dioxide,
            Pollutant::SulphurDioxide => &self.sulphur_dioxide,
            Pollutant::Ozone => &self.ozone,
        };
        series.clone().unwrap_or_else(|| vec![Some(0.0)])
    }
}

impl AirQualityResponse {
    pub fn daily_averages(&self, days: usize) -> crate::Result<PollutantSeries> {
        let hourly = self
            .hourly
            .as_ref()
            .ok_or_else(|| AqiError::api("Open-Meteo response has no hourly block"))?;
        Ok(PollutantSeries::from_fn(|p| {
            daily_averages(&hourly.readings(p), days)
        }))
    }
}
