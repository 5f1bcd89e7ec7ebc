//! Yearly sea water laboratory results, one workbook per year.
//!
//! Every sheet of a workbook carries `Parameter`, `Result` and `Unit`
//! columns. Parameter names are Greek free text and units vary between
//! years, so values are normalised and matched before aggregation.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use super::{units, ReadContext, Reading};
use crate::{matching::ParameterReconciler, model::WaterParameter};

const PARAMETER_COLUMN: &str = "Parameter";
const RESULT_COLUMN: &str = "Result";
const UNIT_COLUMN: &str = "Unit";

/// A row of a results sheet, as text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawWaterRow {
    pub parameter: String,
    pub result: String,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterMeasurement {
    pub parameter: WaterParameter,
    pub value: f64,
}

#[derive(Debug)]
pub struct WaterSource {
    pub year: i32,
    pub measurements: Vec<WaterMeasurement>,
}

impl Reading for WaterSource {
    fn from_file(path: &Path, context: &ReadContext) -> Result<Self> {
        let year = year_from_file_name(path)?;
        let rows = read_sheets(path)?;
        let measurements = normalise_rows(&rows, context.matching.parameter_threshold);

        debug!(
            file = %path.display(),
            year,
            rows = rows.len(),
            kept = measurements.len(),
            "Read sea water file"
        );

        Ok(WaterSource { year, measurements })
    }
}

/// Files are named `<prefix>_<year>[_<anything>].<ext>`.
pub fn year_from_file_name(path: &Path) -> Result<i32> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    stem.split('_')
        .nth(1)
        .and_then(|token| token.trim().parse().ok())
        .ok_or_else(|| anyhow!("Cannot find a year in file name `{}`", path.display()))
}

/// Reads all sheets of a workbook. A CSV file counts as a single sheet.
pub fn read_sheets(path: &Path) -> Result<Vec<RawWaterRow>> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        return read_csv_sheet(path);
    }

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook `{}`", path.display()))?;

    let mut rows = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet)
            .with_context(|| format!("Failed to read sheet `{}` of `{}`", sheet, path.display()))?;

        let mut sheet_rows = range.rows();
        let header: Vec<String> = match sheet_rows.next() {
            Some(header) => header.iter().map(cell_text).collect(),
            None => continue,
        };
        let columns = ResultColumns::locate(&header)
            .with_context(|| format!("Sheet `{}` of `{}`", sheet, path.display()))?;

        rows.extend(sheet_rows.filter_map(|row| {
            columns.extract(|idx| row.get(idx).map(cell_text).unwrap_or_default())
        }));
    }

    Ok(rows)
}

fn read_csv_sheet(path: &Path) -> Result<Vec<RawWaterRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open `{}`", path.display()))?;

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = ResultColumns::locate(&header).with_context(|| path.display().to_string())?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Malformed row in `{}`", path.display()))?;
        if let Some(row) = columns.extract(|idx| record.get(idx).unwrap_or_default().to_string()) {
            rows.push(row);
        }
    }

    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

struct ResultColumns {
    parameter: usize,
    result: usize,
    unit: usize,
}

impl ResultColumns {
    fn locate(header: &[String]) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| anyhow!("Missing `{}` column", name))
        };

        Ok(ResultColumns {
            parameter: find(PARAMETER_COLUMN)?,
            result: find(RESULT_COLUMN)?,
            unit: find(UNIT_COLUMN)?,
        })
    }

    fn extract(&self, cell: impl Fn(usize) -> String) -> Option<RawWaterRow> {
        let parameter = cell(self.parameter);
        if parameter.trim().is_empty() {
            return None;
        }

        Some(RawWaterRow {
            parameter,
            result: cell(self.result),
            unit: cell(self.unit),
        })
    }
}

/// Converts raw rows into canonical measurements.
///
/// The unit is folded into the matching key because the same label means
/// different parameters with different units (dissolved oxygen in mg/l
/// against percent saturation). Rows without a number or without a match are
/// dropped.
pub fn normalise_rows(rows: &[RawWaterRow], threshold: u8) -> Vec<WaterMeasurement> {
    let mut reconciler = ParameterReconciler::new(threshold);

    rows.iter()
        .filter_map(|row| {
            let (value, unit) = units::normalise(units::extract_number(&row.result), &row.unit);
            let key = format!("{}{}", row.parameter.trim(), unit);
            let parameter = reconciler.reconcile(&key)?;

            value.map(|value| WaterMeasurement { parameter, value })
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------
