//! `air_quality.tsv`: monthly pollutant means per municipality.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema},
};

use super::{floats, integers, strings};
use crate::model::{AirPollutant, AirQualityMonthly, LocationName, PollutantValues, YearMonth};

pub const DATE: &str = "date";
pub const YEAR: &str = "year";
pub const LOCATION: &str = "location";
pub const AIR_QUALITY_INDEX: &str = "air_quality_index";

pub fn column_type(name: &str) -> Result<DataType> {
    match name {
        DATE | LOCATION => Ok(DataType::Utf8),
        YEAR => Ok(DataType::Int32),
        AIR_QUALITY_INDEX => Ok(DataType::Float64),
        other if AirPollutant::ALL.iter().any(|p| p.column() == other) => Ok(DataType::Float64),
        other => Err(anyhow!("Unknown air quality column `{}`", other)),
    }
}

fn schema() -> Schema {
    let mut fields = vec![Field::new(DATE, DataType::Utf8, false)];
    fields.extend(
        AirPollutant::ALL
            .iter()
            .map(|p| Field::new(p.column(), DataType::Float64, true)),
    );
    fields.extend([
        Field::new(YEAR, DataType::Int32, false),
        Field::new(LOCATION, DataType::Utf8, false),
        Field::new(AIR_QUALITY_INDEX, DataType::Float64, true),
    ]);

    Schema::new(fields)
}

pub fn to_batch(rows: &[AirQualityMonthly]) -> Result<RecordBatch> {
    let dates: Vec<String> = rows.iter().map(|r| r.period.to_string()).collect();
    let years: Vec<i32> = rows.iter().map(|r| r.period.year).collect();
    let locations: Vec<&str> = rows.iter().map(|r| r.location.as_str()).collect();
    let indices: Vec<Option<f64>> = rows.iter().map(|r| r.air_quality_index).collect();

    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(dates))];
    for pollutant in AirPollutant::ALL {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.values.get(pollutant)).collect();
        columns.push(Arc::new(Float64Array::from(values)));
    }
    columns.push(Arc::new(Int32Array::from(years)));
    columns.push(Arc::new(StringArray::from(locations)));
    columns.push(Arc::new(Float64Array::from(indices)));

    Ok(RecordBatch::try_new(Arc::new(schema()), columns)?)
}

/// Decodes the table. Pollutant columns absent from the file read as missing.
pub fn from_batch(batch: &RecordBatch) -> Result<Vec<AirQualityMonthly>> {
    let dates = strings(batch, DATE)?;
    let locations = strings(batch, LOCATION)?;
    let indices = floats(batch, AIR_QUALITY_INDEX)?;
    let years = integers(batch, YEAR)?;

    let mut pollutants = Vec::new();
    for pollutant in AirPollutant::ALL {
        if batch.column_by_name(pollutant.column()).is_some() {
            pollutants.push((pollutant, floats(batch, pollutant.column())?));
        }
    }

    (0..batch.num_rows())
        .map(|i| {
            let period: YearMonth = dates[i].parse()?;
            if period.year != years[i] {
                return Err(anyhow!("Row {}: year {} does not match {}", i, years[i], period));
            }

            let mut values = PollutantValues::default();
            for (pollutant, column) in &pollutants {
                values.set(*pollutant, column[i]);
            }

            Ok(AirQualityMonthly {
                location: locations[i].parse::<LocationName>()?,
                period,
                values,
                air_quality_index: indices[i],
            })
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------
