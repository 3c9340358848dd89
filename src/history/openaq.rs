//! Backup history source: OpenAQ point measurements
//!
//! OpenAQ reports individual measurements rather than an hourly grid, so
//! every pollutant is reduced to one mean which is repeated for each day of
//! the window. Day-level variation is lost on this path and the projected
//! trend is always flat.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use super::daily::mean;
use super::{FetchOutcome, HistorySource, HistoryWindow};
use crate::AqiError;
use crate::models::{Coordinates, Pollutant, PollutantSeries, round2};

/// Client for the OpenAQ measurements endpoint
pub struct OpenAqMeasurements {
    client: Client,
    base_url: String,
    radius_meters: u32,
    limit: u32,
    api_key: Option<String>,
}

impl OpenAqMeasurements {
    pub fn new(
        base_url: String,
        timeout: Duration,
        radius_meters: u32,
        limit: u32,
    ) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aqi-forecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AqiError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            radius_meters,
            limit,
            api_key: None,
        })
    }

    /// Send `X-API-Key` with every request
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn request_url(&self, location: &Coordinates, window: &HistoryWindow) -> String {
        format!(
            "{}/measurements?coordinates={}&radius={}&limit={}&date_from={}&date_to={}",
            self.base_url,
            urlencoding::encode(&format!("{},{}", location.latitude, location.longitude)),
            self.radius_meters,
            self.limit,
            window.start,
            window.end
        )
    }

    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    async fn fetch_broadcast_means(
        &self,
        location: &Coordinates,
        window: &HistoryWindow,
    ) -> crate::Result<PollutantSeries> {
        let url = self.request_url(location, window);
        debug!("OpenAQ request URL: {}", url);
        let start_time = Instant::now();

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AqiError::api(format!("OpenAQ request failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AqiError::api(format!("OpenAQ answered with status {status}")));
        }

        let body: MeasurementsResponse = response
            .json()
            .await
            .map_err(|e| AqiError::api(format!("Invalid OpenAQ response: {e}")))?;

        let series = body
            .broadcast_means(window.days)
            .ok_or_else(|| AqiError::api("OpenAQ returned no usable measurements"))?;

        info!(
            "Retrieved OpenAQ measurements in {:.3}s",
            start_time.elapsed().as_secs_f64()
        );
        Ok(series)
    }
}

#[async_trait]
impl HistorySource for OpenAqMeasurements {
    fn name(&self) -> &str {
        "openaq"
    }

    async fn fetch(&self, location: &Coordinates, window: &HistoryWindow) -> FetchOutcome {
        self.fetch_broadcast_means(location, window).await.into()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MeasurementsResponse {
    #[serde(default)]
    pub results: Vec<Measurement>,
}

/// A single measurement; both fields are read loosely
#[derive(Debug, Deserialize)]
pub struct Measurement {
    /// Parameter code, either a bare string or an object with a `name`
    pub parameter: Option<Value>,
    pub value: Option<Value>,
}

impl Measurement {
    fn reading(&self) -> Option<(Pollutant, f64)> {
        let code = match self.parameter.as_ref()? {
            Value::String(code) => code.as_str(),
            Value::Object(parameter) => parameter.get("name")?.as_str()?,
            _ => return None,
        };
        let pollutant = Pollutant::from_openaq_code(code)?;
        let value = self.value.as_ref()?.as_f64()?;
        Some((pollutant, value))
    }
}

impl MeasurementsResponse {
    /// Mean per pollutant repeated `days` times, `None` when no measurement is usable.
    ///
    /// Pollutants without a measurement read as 0.
    #[must_use]
    pub fn broadcast_means(&self, days: usize) -> Option<PollutantSeries> {
        let mut readings: BTreeMap<Pollutant, Vec<f64>> = BTreeMap::new();
        for (pollutant, value) in self.results.iter().filter_map(Measurement::reading) {
            readings.entry(pollutant).or_default().push(value);
        }
        if readings.is_empty() {
            return None;
        }

        Some(PollutantSeries::from_fn(|p| {
            let average = readings
                .get(&p)
                .and_then(|values| mean(values))
                .map_or(0.0, round2);
            vec![average; days]
        }))
    }
}
