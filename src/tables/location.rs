//! `location.tsv`: one row per location, geometry as a JSON blob.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{ArrayRef, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema},
};

use super::strings;
use crate::model::{Location, LocationName, MultiPolygon};

pub const NAME: &str = "name";
pub const MULTI_POLYGONS: &str = "multi_polygons";

pub fn column_type(name: &str) -> Result<DataType> {
    match name {
        NAME | MULTI_POLYGONS => Ok(DataType::Utf8),
        other => Err(anyhow!("Unknown location column `{}`", other)),
    }
}

pub fn to_batch(locations: &[Location]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(NAME, DataType::Utf8, false),
        Field::new(MULTI_POLYGONS, DataType::Utf8, false),
    ]));

    let names: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
    let geometries = locations
        .iter()
        .map(|l| serde_json::to_string(&l.multi_polygons))
        .collect::<Result<Vec<_>, _>>()?;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(names)),
        Arc::new(StringArray::from(geometries)),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Decodes the table into location records, parsing each geometry blob.
pub fn from_batch(batch: &RecordBatch) -> Result<Vec<Location>> {
    let names = strings(batch, NAME)?;
    let geometries = strings(batch, MULTI_POLYGONS)?;

    names
        .iter()
        .zip(&geometries)
        .map(|(name, geometry)| {
            let multi_polygons: MultiPolygon = serde_json::from_str(geometry)
                .with_context(|| format!("Invalid geometry for `{}`", name))?;

            Ok(Location {
                name: name.parse::<LocationName>()?,
                multi_polygons,
            })
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn should_embed_geometry_as_nested_arrays() {
        let locations = vec![Location {
            name: LocationName::ThermaikosPort,
            multi_polygons: vec![vec![vec![[22.93, 40.63], [22.94, 40.62]]]],
        }];

        let batch = to_batch(&locations).unwrap();
        let blobs = strings(&batch, MULTI_POLYGONS).unwrap();

        assert_eq!(blobs, vec!["[[[[22.93,40.63],[22.94,40.62]]]]"]);
        assert_eq!(from_batch(&batch).unwrap(), locations);
    }

    #[test]
    fn should_reject_unknown_names() {
        let locations = vec![Location {
            name: LocationName::Volvi,
            multi_polygons: vec![],
        }];
        let batch = to_batch(&locations).unwrap();
        let renamed = RecordBatch::try_new(
            batch.schema(),
            vec![
                Arc::new(StringArray::from(vec!["Atlantis"])),
                batch.column(1).clone(),
            ],
        )
        .unwrap();

        assert!(from_batch(&renamed).is_err());
    }
}
