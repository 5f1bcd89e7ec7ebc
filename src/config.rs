//! Tunable constants of the pipeline.
//!
//! Everything has a built-in default. A TOML file may override any subset,
//! for example:
//!
//! ```toml
//! [matching]
//! parameter_threshold = 80
//!
//! [index.air]
//! co = [0.0, 5000.0, 10000.0]
//!
//! [index.water.temperature]
//! weight = 0.2
//! threshold = 18.0
//! ```

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::model::{AirPollutant, WaterParameter};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub matching: MatchConfig,
    pub index: IndexConfig,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config `{}`", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Invalid config `{}`", path.display()))?;
        config
            .index
            .air
            .validate()
            .with_context(|| format!("Invalid config `{}`", path.display()))?;

        Ok(config)
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    /// Minimum similarity for a raw parameter label to be accepted.
    /// Location labels are always resolved to their best match.
    pub parameter_threshold: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            parameter_threshold: 75,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    pub air: AirIndexConfig,
    pub water: WaterIndexConfig,
}

/// Breakpoint tables, in ascending concentration. Position `k` (1-based) of
/// a table is sub-index level `k`. An empty table excludes the pollutant.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AirIndexConfig {
    pub co: Vec<f64>,
    pub no: Vec<f64>,
    pub no2: Vec<f64>,
    pub so2: Vec<f64>,
    pub o3: Vec<f64>,
}

impl Default for AirIndexConfig {
    fn default() -> Self {
        AirIndexConfig {
            co: vec![0.0, 4400.0, 9400.0],
            no: Vec::new(),
            no2: vec![0.0, 40.0, 90.0, 120.0, 210.0, 400.0, 600.0],
            so2: vec![0.0, 100.0, 200.0, 350.0, 500.0, 750.0, 1000.0],
            o3: vec![0.0, 50.0, 100.0, 130.0, 240.0, 380.0, 800.0],
        }
    }
}

impl AirIndexConfig {
    pub fn breakpoints(&self, pollutant: AirPollutant) -> &[f64] {
        match pollutant {
            AirPollutant::Co => &self.co,
            AirPollutant::No => &self.no,
            AirPollutant::No2 => &self.no2,
            AirPollutant::So2 => &self.so2,
            AirPollutant::O3 => &self.o3,
        }
    }

    /// Every table must be finite and non-decreasing.
    pub fn validate(&self) -> Result<()> {
        for pollutant in AirPollutant::ALL {
            let breakpoints = self.breakpoints(pollutant);
            if breakpoints.iter().any(|b| !b.is_finite()) {
                bail!("`{}` breakpoints must be finite", pollutant.column());
            }
            if breakpoints.windows(2).any(|pair| pair[0] > pair[1]) {
                bail!("`{}` breakpoints must not decrease", pollutant.column());
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WaterTerm {
    pub weight: f64,
    pub threshold: f64,
}

impl WaterTerm {
    const fn new(weight: f64, threshold: f64) -> Self {
        WaterTerm { weight, threshold }
    }
}

/// Weight and reference threshold per parameter. A parameter without a term
/// is reported in the table but does not contribute to the index.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WaterIndexConfig {
    pub temperature: Option<WaterTerm>,
    pub dissolved_oxygen: Option<WaterTerm>,
    pub dissolved_oxygen_percentage: Option<WaterTerm>,
    pub arsenic: Option<WaterTerm>,
    pub lead: Option<WaterTerm>,
    pub cadmium: Option<WaterTerm>,
    pub nickel: Option<WaterTerm>,
    pub copper: Option<WaterTerm>,
}

impl Default for WaterIndexConfig {
    fn default() -> Self {
        WaterIndexConfig {
            temperature: Some(WaterTerm::new(0.15, 20.0)),
            dissolved_oxygen: None,
            dissolved_oxygen_percentage: Some(WaterTerm::new(0.25, 100.0)),
            arsenic: Some(WaterTerm::new(0.15, 0.012)),
            lead: Some(WaterTerm::new(0.1, 0.0044)),
            cadmium: Some(WaterTerm::new(0.15, 0.0055)),
            nickel: Some(WaterTerm::new(0.1, 0.07)),
            copper: Some(WaterTerm::new(0.1, 0.0013)),
        }
    }
}

impl WaterIndexConfig {
    pub fn term(&self, parameter: WaterParameter) -> Option<WaterTerm> {
        match parameter {
            WaterParameter::Temperature => self.temperature,
            WaterParameter::DissolvedOxygen => self.dissolved_oxygen,
            WaterParameter::DissolvedOxygenPercentage => self.dissolved_oxygen_percentage,
            WaterParameter::Arsenic => self.arsenic,
            WaterParameter::Lead => self.lead,
            WaterParameter::Cadmium => self.cadmium,
            WaterParameter::Nickel => self.nickel,
            WaterParameter::Copper => self.copper,
        }
    }
}

// -- Tests -------------------------------------------------------------------
