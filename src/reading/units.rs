//! Numeric extraction and unit harmonisation for spreadsheet results.

use std::sync::OnceLock;

use regex::Regex;

pub const MILLIGRAMS_PER_LITRE: &str = "mg/l";

const NUMBER_PATTERN: &str = r"([-+]?[0-9]*\.[0-9]+|[0-9]+)";

fn number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

    PATTERN.get_or_init(|| Regex::new(NUMBER_PATTERN).ok()).as_ref()
}

/// Returns the first number found in `text`, if any.
///
/// Results are free text in the source sheets (`"<0.5"`, `"12,3 (approx)"`,
/// `"0.004 mg/l"`), so the first decimal or integer token is taken. Only a
/// decimal token carries its sign.
pub fn extract_number(text: &str) -> Option<f64> {
    number_pattern()?
        .find(text)
        .and_then(|token| token.as_str().parse().ok())
}

fn is_micrograms_per_litre(unit: &str) -> bool {
    let unit: String = unit
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    // micro sign (U+00B5), greek mu (U+03BC) and the ascii spelling
    matches!(unit.as_str(), "µg/l" | "μg/l" | "ug/l")
}

/// Converts a value to the canonical unit of its parameter. Only µg/l needs
/// rewriting; every other unit is passed through untouched.
pub fn normalise(value: Option<f64>, unit: &str) -> (Option<f64>, String) {
    if is_micrograms_per_litre(unit) {
        (value.map(|v| v / 1000.0), MILLIGRAMS_PER_LITRE.to_string())
    } else {
        (value, unit.trim().to_string())
    }
}

// -- Tests -------------------------------------------------------------------
