//! AQI projection from pollutant history
//!
//! Each pollutant's last daily value is extrapolated with its most recent
//! day-over-day change, the projected values are fed to the regression model
//! once per horizon day, and the first day's prediction is boosted when the
//! latest particulate levels point to a dust event.

use chrono::{Days, NaiveDate};
use ndarray::{Array1, Axis};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use crate::models::{ForecastPoint, Pollutant, PollutantReadings, PollutantSeries, round2};
use crate::regression::{AqiModel, ModelError};

/// Number of future days predicted per request
pub const FORECAST_DAYS: u32 = 3;

/// Advisory attached to every forecast response
pub const DUST_NOTE: &str = "Day 1 prediction adjusted for realistic dust conditions";

/// Latest day-over-day change per pollutant
pub type TrendEstimate = BTreeMap<Pollutant, f64>;

/// Current conditions plus the predicted days
#[derive(Debug, Clone, PartialEq)]
pub struct AqiProjection {
    /// Most recent daily values, rounded to two decimals
    pub current: PollutantReadings,
    pub predictions: Vec<ForecastPoint>,
    pub dust_factor: f64,
}

/// Last value minus second-to-last, 0 with fewer than two days of history
#[must_use]
pub fn trend(history: &PollutantSeries) -> TrendEstimate {
    history
        .iter()
        .map(|(pollutant, values)| {
            let delta = match values {
                [.., previous, last] => last - previous,
                _ => 0.0,
            };
            (pollutant, delta)
        })
        .collect()
}

/// Multiplier for the first forecast day, from the latest PM2.5 and PM10 levels.
///
/// Tiers are checked from most to least severe with strict thresholds.
#[must_use]
pub fn dust_factor(pm2_5: f64, pm10: f64) -> f64 {
    if pm2_5 > 80.0 || pm10 > 150.0 {
        1.2
    } else if pm2_5 > 50.0 || pm10 > 100.0 {
        1.15
    } else if pm2_5 > 35.0 || pm10 > 70.0 {
        1.1
    } else {
        1.0
    }
}

/// Projected pollutant values `horizon` days ahead, zero padded to `width`
pub fn feature_vector(
    latest: &PollutantReadings,
    trend: &TrendEstimate,
    horizon: u32,
    width: usize,
) -> Result<Vec<f64>, ModelError> {
    if width < Pollutant::ALL.len() {
        return Err(ModelError::WidthMismatch {
            expected: width,
            actual: Pollutant::ALL.len(),
        });
    }

    let mut features: Vec<f64> = Pollutant::ALL
        .iter()
        .map(|p| {
            let last = latest.get(p).copied().unwrap_or(0.0);
            let delta = trend.get(p).copied().unwrap_or(0.0);
            last + delta * f64::from(horizon)
        })
        .collect();
    features.resize(width, 0.0);
    Ok(features)
}

/// Predict AQI for the [`FORECAST_DAYS`] days following `today`
#[instrument(skip_all, fields(%today))]
pub fn predict_future_aqi(
    history: &PollutantSeries,
    model: &dyn AqiModel,
    today: NaiveDate,
) -> Result<AqiProjection, ModelError> {
    let latest = history.latest_readings();
    let trend = trend(history);

    let pm2_5 = latest[&Pollutant::Pm25];
    let pm10 = latest[&Pollutant::Pm10];
    let dust_factor = dust_factor(pm2_5, pm10);
    info!(
        "PM2.5={}, PM10={}, Day 1 dust factor={}",
        pm2_5, pm10, dust_factor
    );

    let mut predictions = Vec::with_capacity(FORECAST_DAYS as usize);
    for day in 1..=FORECAST_DAYS {
        let features = feature_vector(&latest, &trend, day, model.input_width())?;
        let rows = Array1::from(features).insert_axis(Axis(0));
        let raw = model
            .predict(rows.view())?
            .first()
            .copied()
            .ok_or(ModelError::EmptyOutput)?;

        let predicted_aqi = if day == 1 {
            round2(raw * dust_factor)
        } else {
            round2(raw)
        };
        debug!("Day {} raw prediction {} -> {}", day, raw, predicted_aqi);

        predictions.push(ForecastPoint {
            date: today
                .checked_add_days(Days::new(u64::from(day)))
                .unwrap_or(NaiveDate::MAX),
            day: format!("Day {day}"),
            predicted_aqi,
        });
    }

    let current = latest.into_iter().map(|(p, v)| (p, round2(v))).collect();
    Ok(AqiProjection {
        current,
        predictions,
        dust_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayView2;
    use rstest::rstest;
    use std::sync::Mutex;

    /// Returns a fixed value and records every row it sees
    struct RecordingModel {
        output: f64,
        width: usize,
        rows: Mutex<Vec<Vec<f64>>>,
    }

    impl RecordingModel {
        fn new(output: f64) -> Self {
            Self {
                output,
                width: 15,
                rows: Mutex::new(Vec::new()),
            }
        }
    }

    impl AqiModel for RecordingModel {
        fn input_width(&self) -> usize {
            self.width
        }

        fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError> {
            self.rows
                .lock()
                .unwrap()
                .extend(rows.outer_iter().map(|row| row.to_vec()));
            Ok(vec![self.output; rows.nrows()])
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 30).unwrap()
    }

    #[rstest]
    #[case(80.01, 0.0, 1.2)]
    #[case(80.0, 0.0, 1.15)]
    #[case(0.0, 150.5, 1.2)]
    #[case(0.0, 150.0, 1.15)]
    #[case(50.0, 0.0, 1.1)]
    #[case(0.0, 100.0, 1.1)]
    #[case(35.0, 70.0, 1.0)]
    #[case(35.01, 0.0, 1.1)]
    #[case(0.0, 0.0, 1.0)]
    fn test_dust_factor_tiers(#[case] pm2_5: f64, #[case] pm10: f64, #[case] expected: f64) {
        assert_eq!(dust_factor(pm2_5, pm10), expected);
    }

    #[test]
    fn test_trend_uses_last_two_days() {
        let history = PollutantSeries::from_fn(|p| match p {
            Pollutant::Pm10 => vec![10.0, 30.0, 35.5],
            Pollutant::Ozone => vec![12.0],
            _ => vec![4.0, 2.0],
        });
        let trend = trend(&history);
        assert_eq!(trend[&Pollutant::Pm10], 5.5);
        assert_eq!(trend[&Pollutant::Ozone], 0.0);
        assert_eq!(trend[&Pollutant::Pm25], -2.0);
    }

    #[test]
    fn test_feature_vector_is_padded() {
        let history = PollutantSeries::from_fn(|p| match p {
            Pollutant::Pm10 => vec![10.0, 12.0],
            _ => vec![1.0],
        });
        let features =
            feature_vector(&history.latest_readings(), &trend(&history), 3, 15).unwrap();
        assert_eq!(features.len(), 15);
        assert_eq!(features[0], 18.0);
        assert_eq!(features[1..6], [1.0; 5]);
        assert!(features[6..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_feature_vector_rejects_narrow_model() {
        let latest = PollutantSeries::zeros(7).latest_readings();
        assert!(feature_vector(&latest, &TrendEstimate::new(), 1, 4).is_err());
    }

    #[test]
    fn test_dust_factor_applies_to_first_day_only() {
        let history = PollutantSeries::from_fn(|p| match p {
            Pollutant::Pm25 => vec![85.0; 7],
            _ => vec![10.0; 7],
        });
        let model = RecordingModel::new(100.123);
        let projection = predict_future_aqi(&history, &model, today()).unwrap();

        assert_eq!(projection.dust_factor, 1.2);
        let aqi: Vec<f64> = projection
            .predictions
            .iter()
            .map(|p| p.predicted_aqi)
            .collect();
        assert_eq!(aqi, vec![round2(100.123 * 1.2), 100.12, 100.12]);
    }

    #[test]
    fn test_constant_history_scenario() {
        let history = PollutantSeries::from_fn(|_| vec![50.0; 7]);
        let model = RecordingModel::new(120.0);
        let projection = predict_future_aqi(&history, &model, today()).unwrap();

        // PM2.5 of 50 is not above 50 but is above 35
        assert_eq!(projection.dust_factor, 1.1);
        let aqi: Vec<f64> = projection
            .predictions
            .iter()
            .map(|p| p.predicted_aqi)
            .collect();
        assert_eq!(aqi, vec![132.0, 120.0, 120.0]);
        assert!(projection.current.values().all(|v| *v == 50.0));
    }

    #[test]
    fn test_single_day_history_gives_identical_rows() {
        let history = PollutantSeries::from_fn(|_| vec![20.0]);
        let model = RecordingModel::new(60.0);
        predict_future_aqi(&history, &model, today()).unwrap();

        let rows = model.rows.lock().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], rows[1]);
        assert_eq!(rows[1], rows[2]);
    }

    #[test]
    fn test_predictions_are_labeled_from_tomorrow() {
        let history = PollutantSeries::zeros(7);
        let projection =
            predict_future_aqi(&history, &RecordingModel::new(1.0), today()).unwrap();

        let labels: Vec<(String, String)> = projection
            .predictions
            .iter()
            .map(|p| (p.date.format("%Y-%m-%d").to_string(), p.day.clone()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("2024-12-31".to_string(), "Day 1".to_string()),
                ("2025-01-01".to_string(), "Day 2".to_string()),
                ("2025-01-02".to_string(), "Day 3".to_string()),
            ]
        );
    }

    #[test]
    fn test_model_without_output_fails() {
        struct SilentModel;
        impl AqiModel for SilentModel {
            fn input_width(&self) -> usize {
                15
            }
            fn predict(&self, _: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError> {
                Ok(Vec::new())
            }
        }

        let result = predict_future_aqi(&PollutantSeries::zeros(7), &SilentModel, today());
        assert!(matches!(result, Err(ModelError::EmptyOutput)));
    }
}
