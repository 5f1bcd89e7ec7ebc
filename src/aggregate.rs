//! Monthly and yearly means over the normalised samples.
//!
//! Groups live in ordered maps so rows come out sorted by their key, which
//! keeps the written tables identical between runs.

use std::collections::BTreeMap;

use crate::{
    model::{AirPollutant, AirQualityMonthly, LocationName, PollutantValues, SeaWaterYearly, YearMonth},
    reading::{AirSource, WaterSource},
};

#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Averages every pollutant per (location, month). A pollutant never
/// measured in a group stays missing.
pub fn aggregate_air(sources: &[AirSource]) -> Vec<AirQualityMonthly> {
    let mut groups: BTreeMap<(LocationName, YearMonth), [Mean; 5]> = BTreeMap::new();

    for source in sources {
        for sample in &source.samples {
            let means = groups.entry((source.location, sample.period)).or_default();
            for (pollutant, value) in sample.values.present() {
                means[pollutant as usize].push(value);
            }
        }
    }

    groups
        .into_iter()
        .map(|((location, period), means)| {
            let mut values = PollutantValues::default();
            for pollutant in AirPollutant::ALL {
                values.set(pollutant, means[pollutant as usize].value());
            }

            AirQualityMonthly {
                location,
                period,
                values,
                air_quality_index: None,
            }
        })
        .collect()
}

/// Averages every parameter per year and pivots them into one row per year.
/// A year without any measurement gets no row. All sea water data belongs to
/// the port.
pub fn aggregate_water(sources: &[WaterSource]) -> Vec<SeaWaterYearly> {
    let mut groups: BTreeMap<i32, BTreeMap<_, Mean>> = BTreeMap::new();

    for source in sources {
        for measurement in &source.measurements {
            groups
                .entry(source.year)
                .or_default()
                .entry(measurement.parameter)
                .or_default()
                .push(measurement.value);
        }
    }

    groups
        .into_iter()
        .map(|(year, parameters)| SeaWaterYearly {
            year,
            values: parameters
                .into_iter()
                .filter_map(|(parameter, mean)| mean.value().map(|v| (parameter, v)))
                .collect(),
            location: LocationName::ThermaikosPort,
            water_quality_index: None,
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        model::WaterParameter,
        reading::{air::AirSample, water::WaterMeasurement},
    };

    fn sample(year: i32, month: u32, values: &[(AirPollutant, f64)]) -> AirSample {
        let mut pollutants = PollutantValues::default();
        for (pollutant, value) in values {
            pollutants.set(*pollutant, Some(*value));
        }

        AirSample {
            period: YearMonth { year, month },
            values: pollutants,
        }
    }

    fn source(location: LocationName, samples: Vec<AirSample>) -> AirSource {
        AirSource {
            raw_location: location.to_string(),
            location,
            samples,
        }
    }

    #[test]
    fn should_average_per_location_and_month() {
        let sources = vec![
            source(
                LocationName::Thermi,
                vec![
                    sample(2021, 2, &[(AirPollutant::Co, 100.0)]),
                    sample(2021, 1, &[(AirPollutant::Co, 100.0), (AirPollutant::O3, 40.0)]),
                    sample(2021, 1, &[(AirPollutant::Co, 300.0)]),
                ],
            ),
            source(
                LocationName::Delta,
                vec![sample(2021, 1, &[(AirPollutant::No2, 10.0)])],
            ),
        ];

        let rows = aggregate_air(&sources);
        let keys: Vec<_> = rows.iter().map(|r| (r.location, r.period.to_string())).collect();

        assert_eq!(
            keys,
            vec![
                (LocationName::Delta, "2021-01".to_string()),
                (LocationName::Thermi, "2021-01".to_string()),
                (LocationName::Thermi, "2021-02".to_string()),
            ]
        );

        let thermi = &rows[1];
        assert_eq!(thermi.values.get(AirPollutant::Co), Some(200.0));
        // only one of the two samples had ozone
        assert_eq!(thermi.values.get(AirPollutant::O3), Some(40.0));
        assert_eq!(thermi.values.get(AirPollutant::So2), None);
        assert_eq!(thermi.air_quality_index, None);
    }

    #[test]
    fn should_merge_files_of_same_location() {
        let sources = vec![
            source(
                LocationName::Volvi,
                vec![sample(2020, 5, &[(AirPollutant::So2, 2.0)])],
            ),
            source(
                LocationName::Volvi,
                vec![sample(2020, 5, &[(AirPollutant::So2, 4.0)])],
            ),
        ];

        let rows = aggregate_air(&sources);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values.get(AirPollutant::So2), Some(3.0));
    }

    #[test]
    fn should_pivot_water_per_year() {
        let measurement = |parameter, value| WaterMeasurement { parameter, value };
        let sources = vec![
            WaterSource {
                year: 2020,
                measurements: vec![
                    measurement(WaterParameter::Temperature, 18.0),
                    measurement(WaterParameter::Temperature, 22.0),
                    measurement(WaterParameter::Lead, 0.002),
                ],
            },
            WaterSource {
                year: 2019,
                measurements: vec![measurement(WaterParameter::Copper, 0.001)],
            },
        ];

        let rows = aggregate_water(&sources);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2019);
        assert_eq!(rows[0].values.len(), 1);
        assert_eq!(rows[0].location, LocationName::ThermaikosPort);

        assert_eq!(rows[1].values[&WaterParameter::Temperature], 20.0);
        assert_eq!(rows[1].values[&WaterParameter::Lead], 0.002);
        assert!(!rows[1].values.contains_key(&WaterParameter::Copper));
    }

    #[test]
    fn should_skip_years_without_measurements() {
        let sources = vec![
            WaterSource {
                year: 2018,
                measurements: vec![],
            },
            WaterSource {
                year: 2019,
                measurements: vec![WaterMeasurement {
                    parameter: WaterParameter::Copper,
                    value: 0.001,
                }],
            },
        ];

        let rows = aggregate_water(&sources);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2019);
    }
}
