//! HTTP routes of the forecast service

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use chrono::Local;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::aqi;
use crate::config::{AqiConfig, DefaultsConfig};
use crate::forecast::{self, DUST_NOTE};
use crate::history::HistoryFetcher;
use crate::models::{Coordinates, CurrentAqiResponse, ForecastResponse};
use crate::regression::AqiModel;
use crate::{AqiError, Result};

/// Shared, read-only dependencies of every request
#[derive(Clone)]
pub struct AppState {
    fetcher: Arc<HistoryFetcher>,
    model: Arc<dyn AqiModel>,
    defaults: Arc<DefaultsConfig>,
}

impl AppState {
    pub fn new(fetcher: HistoryFetcher, model: Arc<dyn AqiModel>, defaults: DefaultsConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            model,
            defaults: Arc::new(defaults),
        }
    }

    /// State with the configured upstream sources
    pub fn from_config(config: &AqiConfig, model: Arc<dyn AqiModel>) -> Result<Self> {
        let fetcher = HistoryFetcher::from_config(&config.sources)?;
        Ok(Self::new(fetcher, model, config.defaults.clone()))
    }

    fn resolve(&self, query: LocationQuery) -> (String, Coordinates) {
        let city = query.city.unwrap_or_else(|| self.defaults.city.clone());
        let location = Coordinates::new(
            query.lat.unwrap_or(self.defaults.latitude),
            query.lon.unwrap_or(self.defaults.longitude),
        );
        (city, location)
    }
}

/// `city`, `lat` and `lon` query parameters, all optional
#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/forecast", get(get_forecast))
        .route("/aqi/current", get(get_current_aqi))
        .with_state(state)
}

#[instrument(skip(state))]
async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> std::result::Result<Json<ForecastResponse>, AqiError> {
    let (city, location) = state.resolve(query);
    info!("Forecast requested for {} ({})", city, location.format_coordinates());

    let history = state.fetcher.fetch_past_week(&location).await;
    let projection =
        forecast::predict_future_aqi(&history, state.model.as_ref(), Local::now().date_naive())?;

    Ok(Json(ForecastResponse {
        city,
        pollutants: projection.current,
        pollutants_history: history,
        predictions: projection.predictions,
        note: DUST_NOTE,
    }))
}

#[instrument(skip(state))]
async fn get_current_aqi(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Json<CurrentAqiResponse> {
    let (city, location) = state.resolve(query);

    let history = state.fetcher.fetch_past_week(&location).await;
    let pollutants = history.latest_readings();
    let summary = aqi::summarize(&pollutants);

    Json(CurrentAqiResponse {
        city,
        pollutants,
        aqi: summary.aqi,
        dominant_pollutant: summary.dominant,
        sub_indices: summary.sub_indices,
    })
}
