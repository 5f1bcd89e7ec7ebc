//! Reading and writing the canonical tables.
//!
//! Tables are held as arrow `RecordBatch`es and stored as tab separated text
//! with a header row, missing values being empty fields. Every file is
//! written to a temporary file beside its destination and then renamed over
//! it, so a failed run never leaves a half written table behind.

pub mod air_quality;
pub mod location;
pub mod sea_water;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, AsArray, RecordBatch},
    compute::concat_batches,
    csv::{ReaderBuilder, WriterBuilder},
    datatypes::{DataType, Field, Float64Type, Int32Type, Schema},
};
use chrono::NaiveDate;
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use tempfile::NamedTempFile;

use crate::model::{Location, YearMonth};

pub const LOCATION_FILE: &str = "location.tsv";
pub const AIR_QUALITY_FILE: &str = "air_quality.tsv";
pub const SEA_WATER_FILE: &str = "sea_water_quality.tsv";

const DELIMITER: u8 = b'\t';

/// Writes `batch` as TSV, replacing `path` only once the file is complete.
pub fn save_tsv(batch: &RecordBatch, path: &Path) -> Result<()> {
    persist_with(path, |file| {
        let mut writer = WriterBuilder::new()
            .with_header(true)
            .with_delimiter(DELIMITER)
            .build(file);
        writer.write(batch)?;
        Ok(())
    })
}

/// Writes `batch` as a snappy compressed parquet file.
pub fn save_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    persist_with(path, |file| {
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        writer.write(batch)?;
        writer.close()?;
        Ok(())
    })
}

fn persist_with(path: &Path, write: impl FnOnce(&mut File) -> Result<()>) -> Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in `{}`", dir.display()))?;
    write(temp.as_file_mut()).with_context(|| format!("Failed to write `{}`", path.display()))?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace `{}`", path.display()))?;

    Ok(())
}

/// Reads a TSV table, typing each column with `column_type` from its header.
pub fn read_tsv(path: &Path, column_type: impl Fn(&str) -> Result<DataType>) -> Result<RecordBatch> {
    let file = File::open(path).with_context(|| format!("Failed to open `{}`", path.display()))?;

    let mut header = String::new();
    BufReader::new(&file).read_line(&mut header)?;
    let fields = header
        .trim_end_matches(['\r', '\n'])
        .split(DELIMITER as char)
        .map(|name| Ok(Field::new(name, column_type(name)?, true)))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Unexpected header in `{}`", path.display()))?;
    let schema = Arc::new(Schema::new(fields));

    let file = File::open(path)?;
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_delimiter(DELIMITER)
        .build(file)?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse `{}`", path.display()))?;

    Ok(concat_batches(&schema, &batches)?)
}

pub(crate) fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("Missing column `{}`", name))
}

pub(crate) fn strings(batch: &RecordBatch, name: &str) -> Result<Vec<String>> {
    let array = column(batch, name)?
        .as_string_opt::<i32>()
        .ok_or_else(|| anyhow!("Column `{}` is not text", name))?;

    (0..array.len())
        .map(|i| {
            if array.is_null(i) {
                Err(anyhow!("Empty `{}` on row {}", name, i))
            } else {
                Ok(array.value(i).to_string())
            }
        })
        .collect()
}

pub(crate) fn floats(batch: &RecordBatch, name: &str) -> Result<Vec<Option<f64>>> {
    let array = column(batch, name)?
        .as_primitive_opt::<Float64Type>()
        .ok_or_else(|| anyhow!("Column `{}` is not numeric", name))?;

    Ok(array.iter().collect())
}

pub(crate) fn integers(batch: &RecordBatch, name: &str) -> Result<Vec<i32>> {
    let array = column(batch, name)?
        .as_primitive_opt::<Int32Type>()
        .ok_or_else(|| anyhow!("Column `{}` is not an integer", name))?;

    array
        .iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| anyhow!("Empty `{}` on row {}", name, i)))
        .collect()
}

/// Everything the reporting layer reads.
#[derive(Debug)]
pub struct CanonicalData {
    pub location: RecordBatch,
    /// Same rows as `location`, decoded for direct serialisation.
    pub location_records: Vec<Location>,
    pub air_quality: RecordBatch,
    pub sea_water_quality: RecordBatch,
}

impl CanonicalData {
    /// Earliest and latest date covered by either quality table. Months map
    /// to their first day and years to January 1st.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let mut dates = Vec::new();

        for date in strings(&self.air_quality, air_quality::DATE)? {
            let period: YearMonth = date.parse()?;
            dates.extend(period.first_day());
        }
        for year in integers(&self.sea_water_quality, sea_water::YEAR)? {
            dates.extend(NaiveDate::from_ymd_opt(year, 1, 1));
        }

        Ok(dates
            .iter()
            .min()
            .copied()
            .zip(dates.iter().max().copied()))
    }
}

/// Loads the three canonical tables from `dir`.
pub fn load_canonical(dir: &Path) -> Result<CanonicalData> {
    let location = read_tsv(&dir.join(LOCATION_FILE), location::column_type)?;
    let location_records = location::from_batch(&location)?;

    Ok(CanonicalData {
        location,
        location_records,
        air_quality: read_tsv(&dir.join(AIR_QUALITY_FILE), air_quality::column_type)?,
        sea_water_quality: read_tsv(&dir.join(SEA_WATER_FILE), sea_water::column_type)?,
    })
}

/// The destination of each table, in write order.
pub fn table_paths(dir: &Path) -> [PathBuf; 3] {
    [
        dir.join(LOCATION_FILE),
        dir.join(AIR_QUALITY_FILE),
        dir.join(SEA_WATER_FILE),
    ]
}

// -- Tests -------------------------------------------------------------------
