pub mod air;
pub mod geometry;
pub mod units;
pub mod water;

use std::path::Path;

use anyhow::Result;

use crate::{
    config::MatchConfig,
    model::{Location, LocationName},
};

pub use air::AirSource;
pub use geometry::load_locations;
pub use water::WaterSource;

/// Inputs shared by every reader: the matching thresholds and the
/// municipalities present in the loaded geometry.
#[derive(Debug, Clone)]
pub struct ReadContext {
    pub matching: MatchConfig,
    pub municipalities: Vec<LocationName>,
}

impl ReadContext {
    pub fn new(matching: &MatchConfig, locations: &[Location]) -> Self {
        ReadContext {
            matching: matching.clone(),
            municipalities: locations
                .iter()
                .map(|location| location.name)
                .filter(|name| *name != LocationName::ThermaikosPort)
                .collect(),
        }
    }
}

impl Default for ReadContext {
    fn default() -> Self {
        ReadContext {
            matching: MatchConfig::default(),
            municipalities: LocationName::municipalities().collect(),
        }
    }
}

// A raw source file, read and normalised independently of every other file
pub trait Reading: Sized + Send + 'static {
    fn from_file(path: &Path, context: &ReadContext) -> Result<Self>;
}

// -- Tests -------------------------------------------------------------------
