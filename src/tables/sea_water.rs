//! `sea_water_quality.tsv`: yearly parameter means at the port.
//!
//! Only parameters measured in at least one year get a column.

use std::{collections::BTreeSet, sync::Arc};

use anyhow::{anyhow, Result};
use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema},
};

use super::{floats, integers, strings};
use crate::model::{LocationName, SeaWaterYearly, WaterParameter};

pub const YEAR: &str = "year";
pub const LOCATION: &str = "location";
pub const WATER_QUALITY_INDEX: &str = "water_quality_index";

pub fn column_type(name: &str) -> Result<DataType> {
    match name {
        YEAR => Ok(DataType::Int32),
        LOCATION => Ok(DataType::Utf8),
        WATER_QUALITY_INDEX => Ok(DataType::Float64),
        other if WaterParameter::from_column(other).is_some() => Ok(DataType::Float64),
        other => Err(anyhow!("Unknown sea water column `{}`", other)),
    }
}

/// Parameters present in any row, in declaration order.
pub fn present_parameters(rows: &[SeaWaterYearly]) -> Vec<WaterParameter> {
    let present: BTreeSet<WaterParameter> =
        rows.iter().flat_map(|r| r.values.keys().copied()).collect();

    present.into_iter().collect()
}

pub fn to_batch(rows: &[SeaWaterYearly]) -> Result<RecordBatch> {
    let parameters = present_parameters(rows);

    let mut fields = vec![Field::new(YEAR, DataType::Int32, false)];
    fields.extend(
        parameters
            .iter()
            .map(|p| Field::new(p.column(), DataType::Float64, true)),
    );
    fields.extend([
        Field::new(LOCATION, DataType::Utf8, false),
        Field::new(WATER_QUALITY_INDEX, DataType::Float64, true),
    ]);

    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    let locations: Vec<&str> = rows.iter().map(|r| r.location.as_str()).collect();
    let indices: Vec<Option<f64>> = rows.iter().map(|r| r.water_quality_index).collect();

    let mut columns: Vec<ArrayRef> = vec![Arc::new(Int32Array::from(years))];
    for parameter in &parameters {
        let values: Vec<Option<f64>> = rows
            .iter()
            .map(|r| r.values.get(parameter).copied())
            .collect();
        columns.push(Arc::new(Float64Array::from(values)));
    }
    columns.push(Arc::new(StringArray::from(locations)));
    columns.push(Arc::new(Float64Array::from(indices)));

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

pub fn from_batch(batch: &RecordBatch) -> Result<Vec<SeaWaterYearly>> {
    let years = integers(batch, YEAR)?;
    let locations = strings(batch, LOCATION)?;
    let indices = floats(batch, WATER_QUALITY_INDEX)?;

    let mut parameters = Vec::new();
    for parameter in WaterParameter::ALL {
        if batch.column_by_name(parameter.column()).is_some() {
            parameters.push((parameter, floats(batch, parameter.column())?));
        }
    }

    (0..batch.num_rows())
        .map(|i| {
            Ok(SeaWaterYearly {
                year: years[i],
                values: parameters
                    .iter()
                    .filter_map(|(parameter, column)| column[i].map(|v| (*parameter, v)))
                    .collect(),
                location: locations[i].parse::<LocationName>()?,
                water_quality_index: indices[i],
            })
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------
