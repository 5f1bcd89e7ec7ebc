//! Approximate string matching of raw labels onto the canonical vocabulary.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::model::{LocationName, WaterParameter};

/// Known spellings of the sea water parameters, as `label + unit`. Order is
/// the tie-break order when two variants score the same.
pub const PARAMETER_VARIANTS: &[(&str, WaterParameter)] = &[
    ("Θερμοκρασία", WaterParameter::Temperature),
    (
        "Θερμοκρασία κατά την λήψη του δείγματος",
        WaterParameter::Temperature,
    ),
    ("Διαλυμένο Οξυγόνο (mg/l)", WaterParameter::DissolvedOxygen),
    (
        "Ποσοστό κορεσμού διαλυμένου οξυγόνου (% DO)",
        WaterParameter::DissolvedOxygenPercentage,
    ),
    (
        "Διαλυμένο Οξυγόνο (%)",
        WaterParameter::DissolvedOxygenPercentage,
    ),
    ("Αρσενικό (mg/l)", WaterParameter::Arsenic),
    ("Μόλυβδος (mg/l)", WaterParameter::Lead),
    ("Κάδμιο (mg/l)", WaterParameter::Cadmium),
    ("Νικέλιο (mg/l)", WaterParameter::Nickel),
    ("Χαλκός (mg/l)", WaterParameter::Copper),
];

/// Similarity of two strings in `[0, 100]`, ignoring case.
///
/// This is the indel ratio `2 * LCS / (len(a) + len(b))` over Unicode scalar
/// values, rounded to an integer. Only strings that are equal after lower
/// casing score 100.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    if a == b {
        return 100;
    }

    let total = a.len() + b.len();
    let ratio = 200.0 * longest_common_subsequence(&a, &b) as f64 / total as f64;

    (ratio.round() as u8).min(99)
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Returns the candidate with the highest similarity to `raw` together with
/// its score. The first candidate wins a tie.
pub fn best_match<'a, T, I>(raw: &str, candidates: I) -> Option<(T, u8)>
where
    I: IntoIterator<Item = (&'a str, T)>,
{
    let mut best: Option<(T, u8)> = None;

    for (label, value) in candidates {
        let score = similarity(raw, label);
        match &best {
            Some((_, best_score)) if score <= *best_score => {}
            _ => best = Some((value, score)),
        }
    }

    best
}

/// Resolves a raw location label (an air quality directory name) to the
/// closest of `candidates`. There is no threshold, every label resolves
/// unless there are no candidates at all.
pub fn reconcile_location(raw_label: &str, candidates: &[LocationName]) -> Option<LocationName> {
    let (name, score) = best_match(
        raw_label,
        candidates.iter().map(|name| (name.as_str(), *name)),
    )?;

    debug!(raw = raw_label, location = %name, score, "Matched location");

    Some(name)
}

/// Maps raw `label + unit` keys onto canonical water parameters.
///
/// Each distinct key is scored once; keys below the threshold are dropped
/// and reported the first time they are seen.
#[derive(Debug)]
pub struct ParameterReconciler {
    threshold: u8,
    seen: HashMap<String, Option<WaterParameter>>,
}

impl ParameterReconciler {
    pub fn new(threshold: u8) -> Self {
        ParameterReconciler {
            threshold,
            seen: HashMap::new(),
        }
    }

    pub fn reconcile(&mut self, raw_key: &str) -> Option<WaterParameter> {
        let folded = raw_key.to_lowercase();
        if let Some(parameter) = self.seen.get(&folded) {
            return *parameter;
        }

        let parameter = match_parameter(raw_key, self.threshold);
        if parameter.is_none() {
            warn!(parameter = raw_key, "Dropping unrecognised parameter");
        }
        self.seen.insert(folded, parameter);

        parameter
    }
}

/// Stateless variant of [`ParameterReconciler::reconcile`].
pub fn match_parameter(raw_key: &str, threshold: u8) -> Option<WaterParameter> {
    best_match(raw_key, PARAMETER_VARIANTS.iter().copied())
        .filter(|(_, score)| *score >= threshold)
        .map(|(parameter, _)| parameter)
}

// -- Tests -------------------------------------------------------------------
