//! Trailing pollutant history
//!
//! Each [`HistorySource`] makes a single attempt and reports an explicit
//! [`FetchOutcome`]. [`HistoryFetcher`] asks its sources in order and keeps
//! the first successful series; when every source fails it hands out an
//! all-zero series instead of an error.

pub mod daily;
pub mod open_meteo;
pub mod openaq;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::config::SourcesConfig;
use crate::models::{Coordinates, PollutantSeries};

pub use open_meteo::OpenMeteoAirQuality;
pub use openaq::OpenAqMeasurements;

/// Number of daily values in every history series
pub const HISTORY_DAYS: usize = 7;

/// Date range covered by a history request, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Number of daily values to produce
    pub days: usize,
}

impl HistoryWindow {
    /// Window of `days` days before `today`, through `today`
    #[must_use]
    pub fn ending(today: NaiveDate, days: usize) -> Self {
        let start = today
            .checked_sub_days(Days::new(days as u64))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: today,
            days,
        }
    }
}

/// Result of one fetch attempt against one source
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(PollutantSeries),
    Failed(String),
}

impl From<crate::Result<PollutantSeries>> for FetchOutcome {
    fn from(result: crate::Result<PollutantSeries>) -> Self {
        match result {
            Ok(series) => FetchOutcome::Fetched(series),
            Err(e) => FetchOutcome::Failed(e.to_string()),
        }
    }
}

/// A source of daily pollutant averages
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn fetch(&self, location: &Coordinates, window: &HistoryWindow) -> FetchOutcome;
}

/// Ordered fallback chain of history sources
pub struct HistoryFetcher {
    sources: Vec<Box<dyn HistorySource>>,
    days: usize,
}

impl HistoryFetcher {
    /// Chain over `sources` fetching [`HISTORY_DAYS`] days
    #[must_use]
    pub fn new(sources: Vec<Box<dyn HistorySource>>) -> Self {
        Self {
            sources,
            days: HISTORY_DAYS,
        }
    }

    /// Open-Meteo first, OpenAQ as backup
    pub fn from_config(config: &SourcesConfig) -> crate::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let primary = OpenMeteoAirQuality::new(config.air_quality_base_url.clone(), timeout)?;
        let fallback = OpenAqMeasurements::new(
            config.measurements_base_url.clone(),
            timeout,
            config.radius_meters,
            config.measurement_limit,
        )?
        .with_api_key(config.openaq_api_key.clone());

        Ok(Self {
            sources: vec![Box::new(primary), Box::new(fallback)],
            days: config.history_days,
        })
    }

    /// Daily averages for the configured number of days up to today
    pub async fn fetch_past_week(&self, location: &Coordinates) -> PollutantSeries {
        let today = Local::now().date_naive();
        self.fetch_window(location, &HistoryWindow::ending(today, self.days))
            .await
    }

    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    pub async fn fetch_window(
        &self,
        location: &Coordinates,
        window: &HistoryWindow,
    ) -> PollutantSeries {
        for source in &self.sources {
            match source.fetch(location, window).await {
                FetchOutcome::Fetched(series) => {
                    info!("Pollutant history served by {}", source.name());
                    return series;
                }
                FetchOutcome::Failed(reason) => {
                    warn!("{} history fetch failed: {}", source.name(), reason);
                }
            }
        }

        error!(
            "Failed to fetch past pollutant data for {}, using zeros",
            location.format_coordinates()
        );
        PollutantSeries::zeros(window.days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pollutant;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSource {
        outcome: FetchOutcome,
        calls: Arc<AtomicUsize>,
    }

    impl StubSource {
        fn boxed(outcome: FetchOutcome, calls: &Arc<AtomicUsize>) -> Box<dyn HistorySource> {
            Box::new(Self {
                outcome,
                calls: Arc::clone(calls),
            })
        }
    }

    #[async_trait]
    impl HistorySource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch(&self, _: &Coordinates, _: &HistoryWindow) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn window() -> HistoryWindow {
        HistoryWindow::ending(NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(), HISTORY_DAYS)
    }

    fn constant(value: f64) -> PollutantSeries {
        PollutantSeries::from_fn(|_| vec![value; HISTORY_DAYS])
    }

    #[test]
    fn test_window_spans_seven_days_back() {
        let window = window();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary_calls = Arc::new(AtomicUsize::new(0));
        let fallback_calls = Arc::new(AtomicUsize::new(0));
        let fetcher = HistoryFetcher::new(vec![
            StubSource::boxed(FetchOutcome::Fetched(constant(1.0)), &primary_calls),
            StubSource::boxed(FetchOutcome::Fetched(constant(2.0)), &fallback_calls),
        ]);

        let series = fetcher
            .fetch_window(&Coordinates::new(24.86, 67.0), &window())
            .await;

        assert_eq!(series, constant(1.0));
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_after_primary_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = HistoryFetcher::new(vec![
            StubSource::boxed(FetchOutcome::Failed("HTTP 500".into()), &calls),
            StubSource::boxed(FetchOutcome::Fetched(constant(2.0)), &calls),
        ]);

        let series = fetcher
            .fetch_window(&Coordinates::new(24.86, 67.0), &window())
            .await;

        assert_eq!(series, constant(2.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_total_failure_yields_zeros() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = HistoryFetcher::new(vec![
            StubSource::boxed(FetchOutcome::Failed("timeout".into()), &calls),
            StubSource::boxed(FetchOutcome::Failed("HTTP 403".into()), &calls),
        ]);

        let series = fetcher
            .fetch_window(&Coordinates::new(24.86, 67.0), &window())
            .await;

        for pollutant in Pollutant::ALL {
            assert_eq!(series.get(pollutant), &[0.0; HISTORY_DAYS]);
        }
    }

    #[test]
    fn test_history_length_comes_from_config() {
        let config = SourcesConfig::default();
        let fetcher = HistoryFetcher::from_config(&config).unwrap();
        assert_eq!(fetcher.days, config.history_days);
        assert_eq!(fetcher.sources.len(), 2);
        assert_eq!(fetcher.sources[0].name(), "open-meteo");
        assert_eq!(fetcher.sources[1].name(), "openaq");
    }

    #[test]
    fn test_outcome_from_error_keeps_reason() {
        let result: crate::Result<PollutantSeries> = Err(crate::AqiError::api("HTTP 503"));
        assert_eq!(
            FetchOutcome::from(result),
            FetchOutcome::Failed("API error: HTTP 503".into())
        );
    }
}
