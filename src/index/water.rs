//! Water quality index by weighted threshold scoring.

use std::collections::BTreeMap;

use crate::{
    config::{WaterIndexConfig, WaterTerm},
    model::WaterParameter,
};

/// Score in `[0, 100]` of a single parameter against its threshold.
pub fn score(parameter: WaterParameter, value: f64, term: &WaterTerm) -> f64 {
    let threshold = term.threshold;

    match parameter {
        // ideal temperature, penalised symmetrically per degree
        WaterParameter::Temperature => (100.0 * (1.0 - (value - threshold).abs() / 10.0)).max(0.0),
        WaterParameter::DissolvedOxygenPercentage => value.min(threshold),
        _ => (100.0 * (1.0 - value / threshold)).max(0.0),
    }
}

/// Weighted sum of the scores of the parameters present.
///
/// Weights are not renormalised over the present subset, so a year with
/// fewer measurements scores lower. Returns `None` when no weighted
/// parameter is present.
pub fn water_quality_index(
    values: &BTreeMap<WaterParameter, f64>,
    config: &WaterIndexConfig,
) -> Option<f64> {
    values
        .iter()
        .filter(|(_, value)| value.is_finite())
        .filter_map(|(parameter, value)| {
            config
                .term(*parameter)
                .map(|term| term.weight * score(*parameter, *value, &term))
        })
        .reduce(|total, term| total + term)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn should_score_ideal_temperature() {
        let config = WaterIndexConfig::default();
        let values = BTreeMap::from([(WaterParameter::Temperature, 20.0)]);

        assert!(close(water_quality_index(&values, &config).unwrap(), 15.0));
    }

    #[test]
    fn should_add_dissolved_oxygen_term() {
        let config = WaterIndexConfig::default();
        let values = BTreeMap::from([
            (WaterParameter::Temperature, 20.0),
            (WaterParameter::DissolvedOxygenPercentage, 100.0),
        ]);

        assert!(close(water_quality_index(&values, &config).unwrap(), 40.0));
    }

    #[test]
    fn should_cap_and_floor_scores() {
        let config = WaterIndexConfig::default();
        let temperature = config.temperature.unwrap();
        let oxygen = config.dissolved_oxygen_percentage.unwrap();
        let lead = config.lead.unwrap();

        assert!(close(score(WaterParameter::Temperature, 25.0, &temperature), 50.0));
        assert!(close(score(WaterParameter::Temperature, 35.0, &temperature), 0.0));
        assert!(close(score(WaterParameter::DissolvedOxygenPercentage, 120.0, &oxygen), 100.0));
        assert!(close(score(WaterParameter::DissolvedOxygenPercentage, 80.0, &oxygen), 80.0));
        assert!(close(score(WaterParameter::Lead, 0.0022, &lead), 50.0));
        assert!(close(score(WaterParameter::Lead, 0.01, &lead), 0.0));
    }

    #[test]
    fn should_score_perfect_year_100() {
        let config = WaterIndexConfig::default();
        let values = BTreeMap::from([
            (WaterParameter::Temperature, 20.0),
            (WaterParameter::DissolvedOxygen, 7.0),
            (WaterParameter::DissolvedOxygenPercentage, 100.0),
            (WaterParameter::Arsenic, 0.0),
            (WaterParameter::Lead, 0.0),
            (WaterParameter::Cadmium, 0.0),
            (WaterParameter::Nickel, 0.0),
            (WaterParameter::Copper, 0.0),
        ]);

        assert!(close(water_quality_index(&values, &config).unwrap(), 100.0));
    }

    #[test]
    fn should_leave_index_missing_without_weighted_parameters() {
        let config = WaterIndexConfig::default();
        let values = BTreeMap::from([(WaterParameter::DissolvedOxygen, 7.0)]);

        assert_eq!(water_quality_index(&values, &config), None);
        assert_eq!(water_quality_index(&BTreeMap::new(), &config), None);
    }
}
