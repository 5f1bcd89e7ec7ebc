//! Canonical vocabulary and record types shared by every stage of the pipeline.

use std::fmt;

use anyhow::{anyhow, Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// The closed set of locations known to the datasets. Declaration order is the
/// tie-break order for fuzzy matching and the row order of the output tables.
pub enum LocationName {
    AmpelokipiMenemeni,
    Chalkidona,
    Delta,
    Kalamaria,
    KordelioEvosmos,
    Lagadas,
    NeapoliSykies,
    Oraiokastro,
    PavlosMelas,
    PylaiaChortiatis,
    Thermaikos,
    Thermi,
    Thessaloniki,
    Volvi,
    ThermaikosPort,
}

impl LocationName {
    pub const ALL: [LocationName; 15] = [
        LocationName::AmpelokipiMenemeni,
        LocationName::Chalkidona,
        LocationName::Delta,
        LocationName::Kalamaria,
        LocationName::KordelioEvosmos,
        LocationName::Lagadas,
        LocationName::NeapoliSykies,
        LocationName::Oraiokastro,
        LocationName::PavlosMelas,
        LocationName::PylaiaChortiatis,
        LocationName::Thermaikos,
        LocationName::Thermi,
        LocationName::Thessaloniki,
        LocationName::Volvi,
        LocationName::ThermaikosPort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationName::AmpelokipiMenemeni => "Ampelokipi - Menemeni Municipality",
            LocationName::Chalkidona => "Chalkidona Municipality",
            LocationName::Delta => "Delta Municipality",
            LocationName::Kalamaria => "Kalamaria Municipality",
            LocationName::KordelioEvosmos => "Kordelio - Evosmos Municipality",
            LocationName::Lagadas => "Municipality of Lagadas",
            LocationName::NeapoliSykies => "Municipality of Neapoli-Sykies",
            LocationName::Oraiokastro => "Oreokastro Municipality",
            LocationName::PavlosMelas => "Pavlos Melas Municipality",
            LocationName::PylaiaChortiatis => "Municipality of Pylaia - Chortiatis",
            LocationName::Thermaikos => "Thermaikos Municipality",
            LocationName::Thermi => "Thermi Municipality",
            LocationName::Thessaloniki => "Municipality of Thessaloniki",
            LocationName::Volvi => "Volvi Municipality",
            LocationName::ThermaikosPort => "Thermaikos Port",
        }
    }

    /// Municipalities that raw air quality directories can be matched against.
    /// The port is synthetic and only ever assigned to sea water data.
    pub fn municipalities() -> impl Iterator<Item = LocationName> {
        Self::ALL
            .into_iter()
            .filter(|name| *name != LocationName::ThermaikosPort)
    }

    /// Exact lookup by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == name)
    }
}

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LocationName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| anyhow!("Unknown location `{}`", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Air pollutants reported by the municipal sensors.
pub enum AirPollutant {
    Co,
    No,
    No2,
    So2,
    O3,
}

impl AirPollutant {
    pub const ALL: [AirPollutant; 5] = [
        AirPollutant::Co,
        AirPollutant::No,
        AirPollutant::No2,
        AirPollutant::So2,
        AirPollutant::O3,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            AirPollutant::Co => "co",
            AirPollutant::No => "no",
            AirPollutant::No2 => "no2",
            AirPollutant::So2 => "so2",
            AirPollutant::O3 => "o3",
        }
    }

    /// Maps a raw CSV header to a pollutant. Some exports suffix the symbol
    /// with `_conc`, both spellings are accepted.
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim().to_lowercase();
        let symbol = header.strip_suffix("_conc").unwrap_or(&header);
        Self::ALL.into_iter().find(|p| p.column() == symbol)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Physical and chemical sea water parameters.
pub enum WaterParameter {
    Temperature,
    DissolvedOxygen,
    DissolvedOxygenPercentage,
    Arsenic,
    Lead,
    Cadmium,
    Nickel,
    Copper,
}

impl WaterParameter {
    pub const ALL: [WaterParameter; 8] = [
        WaterParameter::Temperature,
        WaterParameter::DissolvedOxygen,
        WaterParameter::DissolvedOxygenPercentage,
        WaterParameter::Arsenic,
        WaterParameter::Lead,
        WaterParameter::Cadmium,
        WaterParameter::Nickel,
        WaterParameter::Copper,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            WaterParameter::Temperature => "temperature",
            WaterParameter::DissolvedOxygen => "dissolved_oxygen",
            WaterParameter::DissolvedOxygenPercentage => "dissolved_oxygen_percentage",
            WaterParameter::Arsenic => "arsenic",
            WaterParameter::Lead => "lead",
            WaterParameter::Cadmium => "cadmium",
            WaterParameter::Nickel => "nickel",
            WaterParameter::Copper => "copper",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.column() == column)
    }
}

/// A calendar month, the aggregation period of the air quality table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of<D: Datelike>(date: &D) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("Expected YYYY-MM, got `{}`", s))?;
        let period = YearMonth {
            year: year.parse()?,
            month: month.parse()?,
        };
        if !(1..=12).contains(&period.month) {
            return Err(anyhow!("Month out of range in `{}`", s));
        }

        Ok(period)
    }
}

/// Ordered (longitude, latitude) pairs, serialized as `[lon, lat]`.
pub type Position = [f64; 2];
pub type Ring = Vec<Position>;
pub type Polygon = Vec<Ring>;
pub type MultiPolygon = Vec<Polygon>;

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: LocationName,
    pub multi_polygons: MultiPolygon,
}

/// Mean pollutant concentrations per pollutant, indexed by `AirPollutant`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PollutantValues([Option<f64>; 5]);

impl PollutantValues {
    pub fn get(&self, pollutant: AirPollutant) -> Option<f64> {
        self.0[pollutant.index()]
    }

    pub fn set(&mut self, pollutant: AirPollutant, value: Option<f64>) {
        self.0[pollutant.index()] = value;
    }

    /// Pollutants with a value, in declaration order.
    pub fn present(&self) -> impl Iterator<Item = (AirPollutant, f64)> + '_ {
        AirPollutant::ALL
            .into_iter()
            .filter_map(|p| self.get(p).map(|v| (p, v)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityMonthly {
    pub location: LocationName,
    pub period: YearMonth,
    pub values: PollutantValues,
    pub air_quality_index: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeaWaterYearly {
    pub year: i32,
    /// Mean value per parameter measured that year.
    pub values: std::collections::BTreeMap<WaterParameter, f64>,
    pub location: LocationName,
    pub water_quality_index: Option<f64>,
}

// -- Tests -------------------------------------------------------------------
