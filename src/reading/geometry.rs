//! Location geometry from the OSM boundary export and the port track.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geojson::{GeoJson, Value as GeoJsonValue};
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::{Location, LocationName, MultiPolygon, Polygon, Position};

#[derive(Debug, Deserialize)]
struct TrackPoint {
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Latitude")]
    latitude: f64,
}

/// Loads every canonical location: the municipalities from the boundary file
/// followed by the port, whose single ring is the ordered point track.
pub fn load_locations(boundaries_path: &Path, track_path: &Path) -> Result<Vec<Location>> {
    let mut locations = read_boundaries(boundaries_path)?;

    let port = Location {
        name: LocationName::ThermaikosPort,
        multi_polygons: vec![vec![read_track(track_path)?]],
    };
    if locations.insert(port.name, port).is_some() {
        bail!("Boundary file already defines `{}`", LocationName::ThermaikosPort);
    }

    info!(count = locations.len(), "Loaded locations");

    Ok(locations.into_values().collect())
}

/// Parses a GeoJSON feature collection keyed by `properties.name_en`.
pub fn read_boundaries(path: &Path) -> Result<BTreeMap<LocationName, Location>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read boundaries `{}`", path.display()))?;
    let geojson = text
        .parse::<GeoJson>()
        .with_context(|| format!("`{}` is not valid GeoJSON", path.display()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        _ => bail!("`{}` must be a GeoJSON FeatureCollection", path.display()),
    };

    let mut locations = BTreeMap::new();

    for feature in collection.features {
        let raw_name = feature
            .property("name_en")
            .and_then(|value| value.as_str())
            .ok_or_else(|| anyhow!("Feature without `name_en` in `{}`", path.display()))?
            .to_string();

        let Some(name) = LocationName::from_name(&raw_name) else {
            warn!(name = raw_name, "Skipping boundary of unknown location");
            continue;
        };

        let geometry = feature
            .geometry
            .ok_or_else(|| anyhow!("Boundary `{}` has no geometry", raw_name))?;

        let multi_polygons = match geometry.value {
            GeoJsonValue::MultiPolygon(polygons) => polygons
                .iter()
                .map(|polygon| to_polygon(polygon.as_slice()))
                .collect::<Result<MultiPolygon>>()?,
            GeoJsonValue::Polygon(polygon) => vec![to_polygon(&polygon)?],
            _ => bail!("Boundary `{}` is not a (multi)polygon", raw_name),
        };

        if locations
            .insert(name, Location { name, multi_polygons })
            .is_some()
        {
            bail!("Duplicate boundary for `{}`", name);
        }
    }

    Ok(locations)
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|p| to_position(p))
                .collect::<Result<Vec<Position>>>()
        })
        .collect()
}

fn to_position(position: &[f64]) -> Result<Position> {
    match position {
        [lon, lat, ..] => Ok([*lon, *lat]),
        _ => Err(anyhow!("Position needs two coordinates, got {:?}", position)),
    }
}

/// Reads the ordered `Longitude`/`Latitude` samples of the port track.
pub fn read_track(path: &Path) -> Result<Vec<Position>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open track `{}`", path.display()))?;

    let mut ring = Vec::new();
    for point in reader.deserialize::<TrackPoint>() {
        let point =
            point.with_context(|| format!("Malformed track point in `{}`", path.display()))?;
        ring.push([point.longitude, point.latitude]);
    }

    if ring.is_empty() {
        bail!("Track `{}` has no points", path.display());
    }

    Ok(ring)
}

// -- Tests -------------------------------------------------------------------
