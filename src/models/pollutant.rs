//! Pollutant identifiers and per-pollutant daily series

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the six pollutants tracked by the forecaster.
///
/// Variant order is the canonical feature order fed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "pm10")]
    Pm10,
    #[serde(rename = "pm2_5")]
    Pm25,
    #[serde(rename = "carbon_monoxide")]
    CarbonMonoxide,
    #[serde(rename = "nitrogen_dioxide")]
    NitrogenDioxide,
    #[serde(rename = "sulphur_dioxide")]
    SulphurDioxide,
    #[serde(rename = "ozone")]
    Ozone,
}

impl Pollutant {
    /// All pollutants in canonical order
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm10,
        Pollutant::Pm25,
        Pollutant::CarbonMonoxide,
        Pollutant::NitrogenDioxide,
        Pollutant::SulphurDioxide,
        Pollutant::Ozone,
    ];

    /// Canonical name, as used by the Open-Meteo hourly parameters and the JSON API
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Pollutant::Pm10 => "pm10",
            Pollutant::Pm25 => "pm2_5",
            Pollutant::CarbonMonoxide => "carbon_monoxide",
            Pollutant::NitrogenDioxide => "nitrogen_dioxide",
            Pollutant::SulphurDioxide => "sulphur_dioxide",
            Pollutant::Ozone => "ozone",
        }
    }

    /// Map an OpenAQ parameter code (`pm25`, `no2`, ...) to a pollutant
    #[must_use]
    pub fn from_openaq_code(code: &str) -> Option<Self> {
        match code {
            "pm10" => Some(Pollutant::Pm10),
            "pm25" => Some(Pollutant::Pm25),
            "co" => Some(Pollutant::CarbonMonoxide),
            "no2" => Some(Pollutant::NitrogenDioxide),
            "so2" => Some(Pollutant::SulphurDioxide),
            "o3" => Some(Pollutant::Ozone),
            _ => None,
        }
    }
}

/// Latest value per pollutant
pub type PollutantReadings = BTreeMap<Pollutant, f64>;

/// Round to two decimal places
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Daily average readings per pollutant, oldest day first.
///
/// Every pollutant is always present; constructors fill missing ones with zeros.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PollutantSeries {
    values: BTreeMap<Pollutant, Vec<f64>>,
}

impl PollutantSeries {
    /// Series of `days` zeros for every pollutant
    #[must_use]
    pub fn zeros(days: usize) -> Self {
        Self::from_fn(|_| vec![0.0; days])
    }

    /// Build a series by computing each pollutant's values
    pub fn from_fn(mut f: impl FnMut(Pollutant) -> Vec<f64>) -> Self {
        let values = Pollutant::ALL.into_iter().map(|p| (p, f(p))).collect();
        Self { values }
    }

    /// Daily values for one pollutant
    #[must_use]
    pub fn get(&self, pollutant: Pollutant) -> &[f64] {
        self.values.get(&pollutant).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Most recent daily value, 0 for an empty series
    #[must_use]
    pub fn latest(&self, pollutant: Pollutant) -> f64 {
        self.get(pollutant).last().copied().unwrap_or(0.0)
    }

    /// Snapshot of the most recent day's values
    #[must_use]
    pub fn latest_readings(&self) -> PollutantReadings {
        Pollutant::ALL
            .into_iter()
            .map(|p| (p, self.latest(p)))
            .collect()
    }

    /// Iterate pollutants with their daily values, in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, &[f64])> {
        self.values.iter().map(|(p, v)| (*p, v.as_slice()))
    }
}
