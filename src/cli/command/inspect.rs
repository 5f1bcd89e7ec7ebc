//! Summary of the canonical tables, read back the way downstream consumers
//! read them.

use std::{collections::BTreeMap, path::Path};

use anyhow::Result;

use crate::{
    fetch::fetch_published_tables,
    model::LocationName,
    tables::{air_quality, load_canonical, sea_water, CanonicalData},
};

pub async fn inspect(data_dir: &Path) -> Result<String> {
    fetch_published_tables(data_dir);
    let data = load_canonical(data_dir)?;

    Ok(summarise(&data)?.join("\n"))
}

fn summarise(data: &CanonicalData) -> Result<Vec<String>> {
    let air = air_quality::from_batch(&data.air_quality)?;
    let water = sea_water::from_batch(&data.sea_water_quality)?;

    let mut lines = vec![
        format!("locations: {}", data.location.num_rows()),
        format!("air quality rows: {}", air.len()),
        format!("sea water rows: {}", water.len()),
    ];
    for location in &data.location_records {
        lines.push(format!(
            "{}: {} polygon(s)",
            location.name,
            location.multi_polygons.len()
        ));
    }

    match data.date_range()? {
        Some((first, last)) => lines.push(format!("dates: {} to {}", first, last)),
        None => lines.push("dates: none".to_string()),
    }

    let mut air_means: BTreeMap<LocationName, Vec<f64>> = BTreeMap::new();
    for row in &air {
        air_means
            .entry(row.location)
            .or_default()
            .extend(row.air_quality_index);
    }
    for (location, indices) in air_means {
        lines.push(format!("{}: mean AQI {}", location, mean(&indices)));
    }

    let water_indices: Vec<f64> = water.iter().filter_map(|r| r.water_quality_index).collect();
    if !water.is_empty() {
        lines.push(format!(
            "{}: mean WQI {}",
            LocationName::ThermaikosPort,
            mean(&water_indices)
        ));
    }

    Ok(lines)
}

fn mean(values: &[f64]) -> String {
    if values.is_empty() {
        "n/a".to_string()
    } else {
        format!("{:.2}", values.iter().sum::<f64>() / values.len() as f64)
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        model::{
            AirPollutant, AirQualityMonthly, Location, PollutantValues, SeaWaterYearly,
            WaterParameter, YearMonth,
        },
        tables::location,
    };

    fn data() -> CanonicalData {
        let locations = vec![Location {
            name: LocationName::ThermaikosPort,
            multi_polygons: vec![vec![vec![[22.93, 40.63]]]],
        }];

        let mut values = PollutantValues::default();
        values.set(AirPollutant::O3, Some(60.0));
        let air = vec![
            AirQualityMonthly {
                location: LocationName::Thermi,
                period: YearMonth { year: 2021, month: 3 },
                values,
                air_quality_index: Some(2.0),
            },
            AirQualityMonthly {
                location: LocationName::Thermi,
                period: YearMonth { year: 2021, month: 4 },
                values,
                air_quality_index: Some(3.0),
            },
        ];
        let water = vec![SeaWaterYearly {
            year: 2020,
            values: BTreeMap::from([(WaterParameter::Temperature, 20.0)]),
            location: LocationName::ThermaikosPort,
            water_quality_index: Some(15.0),
        }];

        CanonicalData {
            location: location::to_batch(&locations).unwrap(),
            location_records: locations,
            air_quality: air_quality::to_batch(&air).unwrap(),
            sea_water_quality: sea_water::to_batch(&water).unwrap(),
        }
    }

    #[test]
    fn should_summarise_tables() {
        let lines = summarise(&data()).unwrap();

        assert_eq!(
            lines,
            vec![
                "locations: 1",
                "air quality rows: 2",
                "sea water rows: 1",
                "Thermaikos Port: 1 polygon(s)",
                "dates: 2020-01-01 to 2021-04-01",
                "Thermi Municipality: mean AQI 2.50",
                "Thermaikos Port: mean WQI 15.00",
            ]
        );
    }

    #[test]
    fn should_print_placeholder_without_indices() {
        assert_eq!(mean(&[]), "n/a");
    }
}
