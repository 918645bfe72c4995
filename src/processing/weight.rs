//! Product weight normalization to kilograms.

use once_cell::sync::Lazy;
use regex::Regex;

use super::coerce::parse_float;
use crate::types::{DataSet, DataType, Value};

/// `"12 x 100"` style multipack magnitudes.
static MULTIPACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+) x (\d+)").unwrap());

const GRAMS_PER_KG: f64 = 1000.0;
const OUNCES_PER_KG: f64 = 35.274;

/// Unit suffix recognised on a raw weight cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    Kilogram,
    Gram,
    Millilitre,
    Ounce,
}

impl WeightUnit {
    pub fn to_kilograms(self, magnitude: f64) -> f64 {
        match self {
            Self::Kilogram => magnitude,
            Self::Gram | Self::Millilitre => magnitude / GRAMS_PER_KG,
            Self::Ounce => magnitude / OUNCES_PER_KG,
        }
    }
}

/// Split raw weight text into its magnitude text and unit.
///
/// Suffixes are checked as `kg`, `ml`, `oz`, then a trailing `" ."` (stripped and the rest
/// re-examined), then a bare trailing `g`. Anything else has no recognisable unit.
pub fn split_weight_units(raw: &str) -> Option<(&str, WeightUnit)> {
    let s = raw.trim_end();
    for (suffix, unit) in [
        ("kg", WeightUnit::Kilogram),
        ("ml", WeightUnit::Millilitre),
        ("oz", WeightUnit::Ounce),
    ] {
        if let Some(magnitude) = s.strip_suffix(suffix) {
            return Some((magnitude, unit));
        }
    }
    if let Some(rest) = s.strip_suffix(" .") {
        return split_weight_units(rest);
    }
    s.strip_suffix('g').map(|magnitude| (magnitude, WeightUnit::Gram))
}

/// Numeric magnitude of the text left after the unit is removed.
///
/// `"N x M"` becomes `(N * M) / 100`.
pub fn parse_magnitude(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(caps) = MULTIPACK.captures(text) {
        let n = parse_float(&caps[1])?;
        let m = parse_float(&caps[2])?;
        return Some((n * m) / 100.0);
    }
    parse_float(text)
}

/// Convert one weight cell to kilograms.
///
/// Numeric cells are taken to be kilograms already. Unparseable or missing cells are missing.
pub fn weight_in_kilograms(value: &Value) -> Value {
    let kg = match value {
        Value::Int64(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        Value::Utf8(s) => split_weight_units(s)
            .and_then(|(magnitude, unit)| parse_magnitude(magnitude).map(|m| unit.to_kilograms(m))),
        _ => None,
    };
    kg.map(Value::Float64).unwrap_or(Value::Null)
}

/// Rewrite column `idx` as kilograms ([`DataType::Float64`]).
pub fn convert_weights(dataset: &mut DataSet, idx: usize) {
    dataset.map_column(idx, |cell| weight_in_kilograms(&cell));
    dataset.set_column_type(idx, DataType::Float64);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kg(raw: &str) -> Option<f64> {
        match weight_in_kilograms(&Value::text(raw)) {
            Value::Float64(v) => Some(v),
            Value::Null => None,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn converts_each_unit_to_kilograms() {
        assert!(approx(kg("500g"), 0.5));
        assert!(approx(kg("100ml"), 0.1));
        assert!(approx(kg("1.6kg"), 1.6));
        assert!(approx(kg("16oz"), 16.0 / 35.274));
        assert!((kg("16oz").unwrap() - 0.4536).abs() < 1e-4);
    }

    #[test]
    fn multipack_is_multiplied_then_scaled() {
        assert!(approx(kg("12 x 100g"), 0.012));
        assert!(approx(kg("8 x 150g"), 0.012));
    }

    #[test]
    fn space_dot_suffix_is_stripped() {
        assert_eq!(split_weight_units("77g ."), Some(("77", WeightUnit::Gram)));
        assert!(approx(kg("77g ."), 0.077));
    }

    #[test]
    fn unparseable_or_missing_is_null() {
        assert_eq!(kg("9GO9NZ5JTL"), None);
        assert_eq!(kg("heavy"), None);
        assert_eq!(kg("abcg"), None);
        assert_eq!(weight_in_kilograms(&Value::Null), Value::Null);
    }

    #[test]
    fn numeric_cells_are_already_kilograms() {
        assert_eq!(weight_in_kilograms(&Value::Float64(0.5)), Value::Float64(0.5));
        assert_eq!(weight_in_kilograms(&Value::Int64(2)), Value::Float64(2.0));
    }
}
