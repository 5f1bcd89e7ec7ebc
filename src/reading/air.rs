//! Hourly sensor exports, one directory per raw station location.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use super::{ReadContext, Reading};
use crate::{
    matching::reconcile_location,
    model::{AirPollutant, LocationName, PollutantValues, YearMonth},
};

const TIME_COLUMN: &str = "time";

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq)]
pub struct AirSample {
    pub period: YearMonth,
    pub values: PollutantValues,
}

/// Every sample of one CSV file, attributed to the municipality matched from
/// the name of its parent directory.
#[derive(Debug)]
pub struct AirSource {
    pub raw_location: String,
    pub location: LocationName,
    pub samples: Vec<AirSample>,
}

impl Reading for AirSource {
    fn from_file(path: &Path, context: &ReadContext) -> Result<Self> {
        let raw_location = path
            .parent()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("`{}` is not inside a location directory", path.display()))?;
        let location = reconcile_location(&raw_location, &context.municipalities)
            .ok_or_else(|| anyhow!("No municipality loaded to match `{}`", raw_location))?;

        let samples = read_samples(path)?;
        debug!(
            file = %path.display(),
            location = %location,
            samples = samples.len(),
            "Read air quality file"
        );

        Ok(AirSource {
            raw_location,
            location,
            samples,
        })
    }
}

pub fn read_samples(path: &Path) -> Result<Vec<AirSample>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open `{}`", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of `{}`", path.display()))?
        .clone();

    let time_idx = headers
        .iter()
        .position(|h| h.trim() == TIME_COLUMN)
        .ok_or_else(|| anyhow!("`{}` has no `{}` column", path.display(), TIME_COLUMN))?;

    let mut columns: Vec<(usize, AirPollutant)> = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(pollutant) = AirPollutant::from_header(header) {
            if !columns.iter().any(|(_, p)| *p == pollutant) {
                columns.push((idx, pollutant));
            }
        }
    }

    let mut samples = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Malformed row {} in `{}`", line + 2, path.display()))?;

        let time = record.get(time_idx).unwrap_or_default();
        let timestamp = parse_time(time)
            .with_context(|| format!("Bad time on row {} of `{}`", line + 2, path.display()))?;

        let mut values = PollutantValues::default();
        for (idx, pollutant) in &columns {
            let value = record.get(*idx).and_then(|cell| cell.trim().parse::<f64>().ok());
            values.set(*pollutant, value.filter(|v| v.is_finite()));
        }

        samples.push(AirSample {
            period: YearMonth::of(&timestamp),
            values,
        });
    }

    Ok(samples)
}

/// Accepts RFC 3339 timestamps, naive date-times and plain dates.
pub fn parse_time(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(timestamp);
        }
    }

    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("Invalid date `{}`", text)),
        Err(_) => bail!("Unrecognised timestamp `{}`", text),
    }
}

// -- Tests -------------------------------------------------------------------
