//! Air quality index from pollutant concentrations
//!
//! Each pollutant's sub-index is a linear interpolation inside the breakpoint
//! band containing its concentration. The overall AQI is the highest
//! sub-index. Bands are closed intervals with small gaps between them; a
//! concentration falling into a gap or above the last band has no sub-index.

use std::collections::BTreeMap;

use crate::models::{Pollutant, PollutantReadings, round2};

/// `(concentration low, concentration high, index low, index high)`
type Breakpoint = (f64, f64, f64, f64);

const PM2_5: [Breakpoint; 6] = [
    (0.0, 30.0, 0.0, 50.0),
    (31.0, 60.0, 51.0, 100.0),
    (61.0, 90.0, 101.0, 200.0),
    (91.0, 120.0, 201.0, 300.0),
    (121.0, 250.0, 301.0, 400.0),
    (251.0, 350.0, 401.0, 500.0),
];

const PM10: [Breakpoint; 6] = [
    (0.0, 50.0, 0.0, 50.0),
    (51.0, 100.0, 51.0, 100.0),
    (101.0, 250.0, 101.0, 200.0),
    (251.0, 350.0, 201.0, 300.0),
    (351.0, 430.0, 301.0, 400.0),
    (431.0, 600.0, 401.0, 500.0),
];

const NO2: [Breakpoint; 6] = [
    (0.0, 40.0, 0.0, 50.0),
    (41.0, 80.0, 51.0, 100.0),
    (81.0, 180.0, 101.0, 200.0),
    (181.0, 280.0, 201.0, 300.0),
    (281.0, 400.0, 301.0, 400.0),
    (401.0, 1000.0, 401.0, 500.0),
];

const SO2: [Breakpoint; 6] = [
    (0.0, 40.0, 0.0, 50.0),
    (41.0, 80.0, 51.0, 100.0),
    (81.0, 380.0, 101.0, 200.0),
    (381.0, 800.0, 201.0, 300.0),
    (801.0, 1600.0, 301.0, 400.0),
    (1601.0, 2600.0, 401.0, 500.0),
];

/// Carbon monoxide bands are in mg/m³
const CO: [Breakpoint; 6] = [
    (0.0, 1.0, 0.0, 50.0),
    (1.1, 2.0, 51.0, 100.0),
    (2.1, 10.0, 101.0, 200.0),
    (10.1, 17.0, 201.0, 300.0),
    (17.1, 34.0, 301.0, 400.0),
    (34.1, 50.0, 401.0, 500.0),
];

const O3: [Breakpoint; 6] = [
    (0.0, 50.0, 0.0, 50.0),
    (51.0, 100.0, 51.0, 100.0),
    (101.0, 168.0, 101.0, 200.0),
    (169.0, 208.0, 201.0, 300.0),
    (209.0, 748.0, 301.0, 400.0),
    (749.0, 1000.0, 401.0, 500.0),
];

fn breakpoints(pollutant: Pollutant) -> &'static [Breakpoint] {
    match pollutant {
        Pollutant::Pm25 => &PM2_5,
        Pollutant::Pm10 => &PM10,
        Pollutant::NitrogenDioxide => &NO2,
        Pollutant::SulphurDioxide => &SO2,
        Pollutant::CarbonMonoxide => &CO,
        Pollutant::Ozone => &O3,
    }
}

/// Sub-index of one pollutant; `concentration` is in µg/m³ for all pollutants
#[must_use]
pub fn sub_index(pollutant: Pollutant, concentration: f64) -> Option<f64> {
    let concentration = match pollutant {
        Pollutant::CarbonMonoxide => concentration / 1000.0,
        _ => concentration,
    };

    breakpoints(pollutant)
        .iter()
        .find(|(low, high, _, _)| (*low..=*high).contains(&concentration))
        .map(|(low, high, index_low, index_high)| {
            (index_high - index_low) / (high - low) * (concentration - low) + index_low
        })
}

/// Overall index with the pollutant that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct AqiSummary {
    pub aqi: Option<f64>,
    pub dominant: Option<Pollutant>,
    /// Sub-index per pollutant that falls inside a band, rounded to two decimals
    pub sub_indices: BTreeMap<Pollutant, f64>,
}

#[must_use]
pub fn summarize(readings: &PollutantReadings) -> AqiSummary {
    let sub_indices: BTreeMap<Pollutant, f64> = readings
        .iter()
        .filter_map(|(pollutant, value)| Some((*pollutant, sub_index(*pollutant, *value)?)))
        .collect();

    let dominant = sub_indices
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(pollutant, index)| (*pollutant, *index));

    AqiSummary {
        aqi: dominant.map(|(_, index)| round2(index)),
        dominant: dominant.map(|(pollutant, _)| pollutant),
        sub_indices: sub_indices
            .into_iter()
            .map(|(p, index)| (p, round2(index)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Pollutant::Pm25, 0.0, Some(0.0))]
    #[case(Pollutant::Pm25, 30.0, Some(50.0))]
    #[case(Pollutant::Pm25, 75.5, Some(150.5))]
    #[case(Pollutant::Pm10, 175.5, Some(150.5))]
    #[case(Pollutant::CarbonMonoxide, 500.0, Some(25.0))]
    #[case(Pollutant::Ozone, 1000.0, Some(500.0))]
    fn test_sub_index(
        #[case] pollutant: Pollutant,
        #[case] concentration: f64,
        #[case] expected: Option<f64>,
    ) {
        assert_eq!(sub_index(pollutant, concentration).map(round2), expected);
    }

    #[rstest]
    #[case(Pollutant::Pm25, 30.5)]
    #[case(Pollutant::Pm25, 400.0)]
    #[case(Pollutant::NitrogenDioxide, -1.0)]
    #[case(Pollutant::CarbonMonoxide, 1050.0)]
    fn test_concentration_outside_bands(#[case] pollutant: Pollutant, #[case] concentration: f64) {
        assert_eq!(sub_index(pollutant, concentration), None);
    }

    #[test]
    fn test_summary_picks_highest_sub_index() {
        let readings: PollutantReadings = [
            (Pollutant::Pm25, 75.5),
            (Pollutant::Pm10, 40.0),
            (Pollutant::Ozone, 30.5),
        ]
        .into_iter()
        .collect();

        let summary = summarize(&readings);
        assert_eq!(summary.aqi, Some(150.5));
        assert_eq!(summary.dominant, Some(Pollutant::Pm25));
        assert_eq!(summary.sub_indices.len(), 3);
        assert_eq!(summary.sub_indices[&Pollutant::Pm10], 40.0);
    }

    #[test]
    fn test_summary_without_any_band() {
        let readings: PollutantReadings = [(Pollutant::Pm25, 30.5)].into_iter().collect();
        let summary = summarize(&readings);
        assert_eq!(summary.aqi, None);
        assert_eq!(summary.dominant, None);
        assert!(summary.sub_indices.is_empty());
    }
}
