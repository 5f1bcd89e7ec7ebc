//! The preprocessing run: raw inputs in, canonical tables out.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    aggregate::{aggregate_air, aggregate_water},
    cli::create_spinner,
    config::PipelineConfig,
    deserialise::deserialise,
    index::{air_quality_index, water_quality_index},
    model::LocationName,
    reading::{load_locations, AirSource, ReadContext, WaterSource},
    tables::{self, air_quality, location, save_parquet, save_tsv, sea_water},
};

pub const BOUNDARIES_FILE: &str = "osm-boundaries.geojson";
pub const TRACK_FILE: &str = "maps-co-thermaikos.csv";
pub const AIR_QUALITY_DIR: &str = "Air Quality";
pub const SEA_WATER_DIR: &str = "Sea Water Quality";

const AIR_EXTENSIONS: [&str; 1] = ["csv"];
const SEA_WATER_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "ods", "csv"];

/// Builds the three canonical tables from `data_dir` and writes them to
/// `output_dir`. Nothing is written unless every input was read.
pub async fn preprocess(
    data_dir: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
    parquet: bool,
) -> Result<Vec<PathBuf>> {
    let spinner = create_spinner("Loading locations...".to_string());
    let locations = load_locations(&data_dir.join(BOUNDARIES_FILE), &data_dir.join(TRACK_FILE))?;
    spinner.finish_with_message(format!("{} locations loaded", locations.len()));

    let context = ReadContext::new(&config.matching, &locations);

    let air_files = air_quality_files(&data_dir.join(AIR_QUALITY_DIR))?;
    let air_sources: Vec<AirSource> =
        deserialise(&air_files, &context, "Reading air quality files").await?;

    let stations: BTreeMap<&str, LocationName> = air_sources
        .iter()
        .map(|source| (source.raw_location.as_str(), source.location))
        .collect();
    for (raw, location) in stations {
        info!(raw, location = %location, "Air quality station");
    }

    let water_files = list_files(&data_dir.join(SEA_WATER_DIR), &SEA_WATER_EXTENSIONS)?;
    let water_sources: Vec<WaterSource> =
        deserialise(&water_files, &context, "Reading sea water files").await?;

    let mut air_rows = aggregate_air(&air_sources);
    for row in &mut air_rows {
        row.air_quality_index = air_quality_index(&row.values, &config.index.air);
    }

    let mut water_rows = aggregate_water(&water_sources);
    for row in &mut water_rows {
        row.water_quality_index = water_quality_index(&row.values, &config.index.water);
    }

    info!(
        locations = locations.len(),
        air_rows = air_rows.len(),
        water_rows = water_rows.len(),
        "Built canonical tables"
    );

    let batches = [
        location::to_batch(&locations)?,
        air_quality::to_batch(&air_rows)?,
        sea_water::to_batch(&water_rows)?,
    ];

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create `{}`", output_dir.display()))?;

    let spinner = create_spinner("Writing tables...".to_string());
    let mut written = Vec::new();
    for (batch, path) in batches.iter().zip(tables::table_paths(output_dir)) {
        save_tsv(batch, &path)?;
        if parquet {
            let parquet_path = path.with_extension("parquet");
            save_parquet(batch, &parquet_path)?;
            written.push(parquet_path);
        }
        written.push(path);
    }
    spinner.finish_with_message("Tables written");

    Ok(written)
}

/// Every CSV under the per-location subdirectories of `dir`, sorted.
fn air_quality_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for location_dir in sorted_entries(dir)? {
        if location_dir.is_dir() {
            files.extend(list_files(&location_dir, &AIR_EXTENSIONS)?);
        } else {
            warn!(file = %location_dir.display(), "Skipping file outside a location directory");
        }
    }

    if files.is_empty() {
        warn!(dir = %dir.display(), "No air quality files found");
    }

    Ok(files)
}

/// Files in `dir` with one of `extensions`, sorted by path.
fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let files = sorted_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        })
        .collect();

    Ok(files)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory `{}`", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    Ok(entries)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use crate::tables::load_canonical;
    use tempfile::TempDir;

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name_en": "Kalamaria Municipality" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[22.95, 40.58], [22.97, 40.58], [22.96, 40.60], [22.95, 40.58]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name_en": "Delta Municipality" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[22.70, 40.60], [22.80, 40.60], [22.75, 40.70], [22.70, 40.60]]]]
                }
            }
        ]
    }"#;

    fn data_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::write(root.join(BOUNDARIES_FILE), BOUNDARIES).unwrap();
        fs::write(
            root.join(TRACK_FILE),
            "Longitude,Latitude\n22.93,40.63\n22.94,40.62\n22.92,40.61\n",
        )
        .unwrap();

        let kalamaria = root.join(AIR_QUALITY_DIR).join("Kalamaria");
        fs::create_dir_all(&kalamaria).unwrap();
        fs::write(
            kalamaria.join("2022.csv"),
            "time,o3_conc,no2_conc\n\
             2022-07-01 00:00:00,50,\n\
             2022-07-15 12:00:00,70,\n\
             2022-08-01 00:00:00,,100\n",
        )
        .unwrap();

        let delta = root.join(AIR_QUALITY_DIR).join("Delta");
        fs::create_dir_all(&delta).unwrap();
        fs::write(delta.join("2022.csv"), "time,co_conc\n2022-07-03,1000\n").unwrap();

        let water = root.join(SEA_WATER_DIR);
        fs::create_dir_all(&water).unwrap();
        fs::write(
            water.join("port_2020.csv"),
            "Parameter,Result,Unit\nΘερμοκρασία,20,°C\nΧαλκός,5 µg/l,µg/l\n",
        )
        .unwrap();
        fs::write(
            water.join("port_2019_extra.csv"),
            "Parameter,Result,Unit\nΘερμοκρασία,18,°C\nΘερμοκρασία,22,°C\n",
        )
        .unwrap();
        fs::write(water.join("notes.txt"), "ignored").unwrap();

        dir
    }

    #[tokio::test]
    async fn should_build_canonical_tables() {
        let data = data_dir();
        let config = PipelineConfig::default();

        let written = preprocess(data.path(), data.path(), &config, false)
            .await
            .unwrap();
        assert_eq!(written.len(), 3);

        let canonical = load_canonical(data.path()).unwrap();
        let names: Vec<_> = canonical
            .location_records
            .iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(
            names,
            vec![
                LocationName::Delta,
                LocationName::Kalamaria,
                LocationName::ThermaikosPort
            ]
        );

        let air = air_quality::from_batch(&canonical.air_quality).unwrap();
        let periods: Vec<_> = air
            .iter()
            .map(|r| (r.location, r.period.to_string()))
            .collect();
        assert_eq!(
            periods,
            vec![
                (LocationName::Delta, "2022-07".to_string()),
                (LocationName::Kalamaria, "2022-07".to_string()),
                (LocationName::Kalamaria, "2022-08".to_string()),
            ]
        );
        assert!((air[1].air_quality_index.unwrap() - 2.2).abs() < 1e-9);

        let water = sea_water::from_batch(&canonical.sea_water_quality).unwrap();
        let years: Vec<_> = water.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2019, 2020]);
        assert!((water[0].water_quality_index.unwrap() - 15.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn should_produce_identical_output_when_run_twice() {
        let data = data_dir();
        let config = PipelineConfig::default();

        let first = preprocess(data.path(), data.path(), &config, false)
            .await
            .unwrap();
        let before: Vec<Vec<u8>> = first.iter().map(|p| fs::read(p).unwrap()).collect();

        let second = preprocess(data.path(), data.path(), &config, false)
            .await
            .unwrap();
        let after: Vec<Vec<u8>> = second.iter().map(|p| fs::read(p).unwrap()).collect();

        assert_eq!(first, second);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn should_write_parquet_beside_tables() {
        let data = data_dir();
        let output = TempDir::new().unwrap();
        let target = output.path().join("tables");

        let written = preprocess(data.path(), &target, &PipelineConfig::default(), true)
            .await
            .unwrap();

        assert_eq!(written.len(), 6);
        assert!(target.join("air_quality.parquet").exists());
    }

    #[tokio::test]
    async fn should_not_write_when_an_input_is_malformed() {
        let data = data_dir();
        fs::write(
            data.path().join(SEA_WATER_DIR).join("port_undated.csv"),
            "Parameter,Result,Unit\n",
        )
        .unwrap();
        let output = TempDir::new().unwrap();

        let result = preprocess(data.path(), output.path(), &PipelineConfig::default(), false).await;

        assert!(result.is_err());
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn should_match_stations_against_loaded_boundaries_only() {
        let data = data_dir();
        let thermaikos = data.path().join(AIR_QUALITY_DIR).join("Thermaikos");
        fs::create_dir_all(&thermaikos).unwrap();
        fs::write(thermaikos.join("2022.csv"), "time,o3_conc
2022-01-10,60
").unwrap();

        preprocess(data.path(), data.path(), &PipelineConfig::default(), false)
            .await
            .unwrap();

        let canonical = load_canonical(data.path()).unwrap();
        let loaded: Vec<_> = canonical
            .location_records
            .iter()
            .map(|l| l.name)
            .collect();
        let air = air_quality::from_batch(&canonical.air_quality).unwrap();

        assert!(air.iter().all(|row| loaded.contains(&row.location)));
        assert!(air
            .iter()
            .any(|row| row.location == LocationName::Delta && row.period.month == 1));
    }

    #[tokio::test]
    async fn should_skip_years_without_recognised_parameters() {
        let data = data_dir();
        fs::write(
            data.path().join(SEA_WATER_DIR).join("port_2018.csv"),
            "Parameter,Result,Unit
Χρώμα,3,Pt-Co
",
        )
        .unwrap();

        preprocess(data.path(), data.path(), &PipelineConfig::default(), false)
            .await
            .unwrap();

        let canonical = load_canonical(data.path()).unwrap();
        let water = sea_water::from_batch(&canonical.sea_water_quality).unwrap();
        let years: Vec<_> = water.iter().map(|r| r.year).collect();

        assert_eq!(years, vec![2019, 2020]);
    }
}
