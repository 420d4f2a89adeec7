//! # Measurement Types Module
//!
//! This module defines the known-unit table used across the pipeline: canonical
//! unit identifiers, their kind (mass, volume or count), spelling lookup and the
//! factors used to convert a quantity into grams or millilitres.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical unit identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitId {
    // Volume units
    Ml,
    L,
    Cup,
    Tablespoon,
    Teaspoon,
    Quart,
    Pint,
    Gallon,
    #[serde(rename = "fluid_oz")]
    FluidOunce,
    Dash,
    Pinch,
    Handful,
    Fistful,
    Smidgen,

    // Mass units
    G,
    Kg,
    Pound,
    Ounce,

    // Count units
    #[serde(rename = "ea")]
    Each,
    Pkg,
    Bunch,
}

/// The physical dimension a unit measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Mass,
    Volume,
    Count,
}

impl UnitId {
    /// The canonical spelling used in output records (e.g. "tablespoon", "ea")
    pub fn canonical_name(&self) -> &'static str {
        match self {
            UnitId::Ml => "ml",
            UnitId::L => "l",
            UnitId::Cup => "cup",
            UnitId::Tablespoon => "tablespoon",
            UnitId::Teaspoon => "teaspoon",
            UnitId::Quart => "quart",
            UnitId::Pint => "pint",
            UnitId::Gallon => "gallon",
            UnitId::FluidOunce => "fluid_oz",
            UnitId::Dash => "dash",
            UnitId::Pinch => "pinch",
            UnitId::Handful => "handful",
            UnitId::Fistful => "fistful",
            UnitId::Smidgen => "smidgen",
            UnitId::G => "g",
            UnitId::Kg => "kg",
            UnitId::Pound => "pound",
            UnitId::Ounce => "ounce",
            UnitId::Each => "ea",
            UnitId::Pkg => "pkg",
            UnitId::Bunch => "bunch",
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self {
            UnitId::G | UnitId::Kg | UnitId::Pound | UnitId::Ounce => UnitKind::Mass,
            UnitId::Each | UnitId::Pkg | UnitId::Bunch => UnitKind::Count,
            _ => UnitKind::Volume,
        }
    }

    /// Whether this unit counts items rather than measuring them
    pub fn is_count(&self) -> bool {
        self.kind() == UnitKind::Count
    }

    /// Grams in one unit, for mass units
    pub fn grams_per_unit(&self) -> Option<f64> {
        match self {
            UnitId::G => Some(1.0),
            UnitId::Kg => Some(1000.0),
            UnitId::Pound => Some(453.592),
            UnitId::Ounce => Some(28.3495),
            _ => None,
        }
    }

    /// Millilitres in one unit, for volume units
    pub fn millilitres_per_unit(&self) -> Option<f64> {
        match self {
            UnitId::Ml => Some(1.0),
            UnitId::L => Some(1000.0),
            UnitId::Cup => Some(236.588),
            UnitId::Tablespoon => Some(14.7868),
            UnitId::Teaspoon => Some(4.92892),
            UnitId::Quart => Some(946.353),
            UnitId::Pint => Some(473.176),
            UnitId::Gallon => Some(3785.41),
            UnitId::FluidOunce => Some(29.5735),
            UnitId::Dash => Some(0.616),
            UnitId::Pinch => Some(0.308),
            UnitId::Handful => Some(118.0),
            UnitId::Fistful => Some(59.0),
            UnitId::Smidgen => Some(0.154),
            _ => None,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

lazy_static! {
    /// Every recognized spelling mapped to its canonical unit.
    ///
    /// Lookups try the exact spelling first so that "T" and "t" stay distinct.
    static ref UNIT_SPELLINGS: HashMap<&'static str, UnitId> = {
        let mut map = HashMap::new();
        for (spelling, unit) in [
            ("ml", UnitId::Ml),
            ("milliliter", UnitId::Ml),
            ("millilitre", UnitId::Ml),
            ("l", UnitId::L),
            ("liter", UnitId::L),
            ("litre", UnitId::L),
            ("g", UnitId::G),
            ("gr", UnitId::G),
            ("gram", UnitId::G),
            ("gramme", UnitId::G),
            ("kg", UnitId::Kg),
            ("kilo", UnitId::Kg),
            ("kilogram", UnitId::Kg),
            ("kilogramme", UnitId::Kg),
            ("c", UnitId::Cup),
            ("cup", UnitId::Cup),
            ("T", UnitId::Tablespoon),
            ("tbsp", UnitId::Tablespoon),
            ("tbs", UnitId::Tablespoon),
            ("tablespoon", UnitId::Tablespoon),
            ("t", UnitId::Teaspoon),
            ("tsp", UnitId::Teaspoon),
            ("teaspoon", UnitId::Teaspoon),
            ("lb", UnitId::Pound),
            ("lbs", UnitId::Pound),
            ("pound", UnitId::Pound),
            ("oz", UnitId::Ounce),
            ("ounce", UnitId::Ounce),
            ("qt", UnitId::Quart),
            ("quart", UnitId::Quart),
            ("pt", UnitId::Pint),
            ("pint", UnitId::Pint),
            ("gal", UnitId::Gallon),
            ("gallon", UnitId::Gallon),
            ("floz", UnitId::FluidOunce),
            ("fl-oz", UnitId::FluidOunce),
            ("dash", UnitId::Dash),
            ("pinch", UnitId::Pinch),
            ("handful", UnitId::Handful),
            ("fistful", UnitId::Fistful),
            ("smidgen", UnitId::Smidgen),
            ("ea", UnitId::Each),
            ("slice", UnitId::Each),
            ("stalk", UnitId::Each),
            ("sprig", UnitId::Each),
            ("clove", UnitId::Each),
            ("can", UnitId::Pkg),
            ("tin", UnitId::Pkg),
            ("jar", UnitId::Pkg),
            ("package", UnitId::Pkg),
            ("packet", UnitId::Pkg),
            ("pkg", UnitId::Pkg),
            ("bunch", UnitId::Bunch),
        ] {
            map.insert(spelling, unit);
        }
        map
    };
}

/// Spellings that are ordinary words or single letters outside a measurement
/// context. They only count as units right after a quantity.
const CONTEXT_GATED_SPELLINGS: &[&str] = &["c", "t", "l", "g", "can", "cans", "tin", "tins"];

fn lookup_exact(spelling: &str) -> Option<UnitId> {
    UNIT_SPELLINGS
        .get(spelling)
        .or_else(|| UNIT_SPELLINGS.get(spelling.to_lowercase().as_str()))
        .copied()
}

/// Resolve a unit spelling (singular or regular plural) to its canonical unit
///
/// # Arguments
///
/// * `spelling` - A unit token such as "tbsp", "Cups" or "pinches"; a trailing
///   period is ignored ("oz.")
///
/// # Returns
///
/// `Some(UnitId)` for a known spelling, `None` otherwise
///
/// # Examples
///
/// ```rust
/// use ghgi::measurement_types::{canonical, UnitId};
///
/// assert_eq!(canonical("tbsp"), Some(UnitId::Tablespoon));
/// assert_eq!(canonical("pinches"), Some(UnitId::Pinch));
/// assert_eq!(canonical("spoonful"), None);
/// ```
pub fn canonical(spelling: &str) -> Option<UnitId> {
    let spelling = spelling.strip_suffix('.').unwrap_or(spelling);
    if spelling.is_empty() {
        return None;
    }
    if let Some(unit) = lookup_exact(spelling) {
        return Some(unit);
    }
    // Single letters have no plural form ("ts" is not teaspoons)
    if spelling.len() <= 2 {
        return None;
    }
    if let Some(stem) = spelling.strip_suffix("es") {
        if let Some(unit) = lookup_exact(stem) {
            return Some(unit);
        }
    }
    spelling.strip_suffix('s').and_then(lookup_exact)
}

/// Whether `spelling` only names a unit when it directly follows a quantity
pub fn is_context_gated(spelling: &str) -> bool {
    let spelling = spelling.strip_suffix('.').unwrap_or(spelling);
    CONTEXT_GATED_SPELLINGS.contains(&spelling) || CONTEXT_GATED_SPELLINGS.contains(&spelling.to_lowercase().as_str())
}

/// Convert a quantity into grams (mass units), millilitres (volume units), or
/// grams again when a specific gravity is supplied for a volume unit.
/// Count units pass through unchanged.
pub fn to_metric(quantity: f64, unit: UnitId, specific_gravity: Option<f64>) -> f64 {
    if let Some(grams) = unit.grams_per_unit() {
        return quantity * grams;
    }
    if let Some(ml) = unit.millilitres_per_unit() {
        let volume = quantity * ml;
        return match specific_gravity {
            Some(sg) if sg != 0.0 => volume * sg,
            _ => volume,
        };
    }
    quantity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_spellings() {
        let cases = vec![
            ("tbsp", UnitId::Tablespoon),
            ("tablespoon", UnitId::Tablespoon),
            ("Tablespoons", UnitId::Tablespoon),
            ("T", UnitId::Tablespoon),
            ("t", UnitId::Teaspoon),
            ("tsp.", UnitId::Teaspoon),
            ("cups", UnitId::Cup),
            ("c", UnitId::Cup),
            ("grams", UnitId::G),
            ("lbs", UnitId::Pound),
            ("pinches", UnitId::Pinch),
            ("dashes", UnitId::Dash),
            ("bunches", UnitId::Bunch),
            ("cans", UnitId::Pkg),
            ("cloves", UnitId::Each),
            ("litres", UnitId::L),
        ];
        for (spelling, expected) in cases {
            assert_eq!(canonical(spelling), Some(expected), "spelling '{}'", spelling);
        }
    }

    #[test]
    fn test_canonical_is_shared_by_aliases() {
        assert_eq!(canonical("tbsp"), canonical("tablespoon"));
        assert_eq!(canonical("tbsp").map(|u| u.canonical_name()), Some("tablespoon"));
    }

    #[test]
    fn test_unknown_spellings() {
        for spelling in ["flour", "ts", "", ".", "inch", "spoonful"] {
            assert_eq!(canonical(spelling), None, "spelling '{}'", spelling);
        }
    }

    #[test]
    fn test_unit_kinds() {
        assert_eq!(UnitId::Pound.kind(), UnitKind::Mass);
        assert_eq!(UnitId::Handful.kind(), UnitKind::Volume);
        assert!(UnitId::Pkg.is_count());
        assert!(!UnitId::Ml.is_count());
    }

    #[test]
    fn test_to_metric() {
        assert_eq!(to_metric(2.0, UnitId::Kg, None), 2000.0);
        assert_eq!(to_metric(200.0, UnitId::Ml, Some(2.0)), 400.0);
        assert_eq!(to_metric(1.0, UnitId::Cup, None), 236.588);
        assert_eq!(to_metric(1.0, UnitId::Cup, Some(0.0)), 236.588);
        assert_eq!(to_metric(3.0, UnitId::Each, Some(2.0)), 3.0);
    }

    #[test]
    fn test_context_gated() {
        assert!(is_context_gated("c"));
        assert!(is_context_gated("Can"));
        assert!(!is_context_gated("cup"));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&UnitId::Each).unwrap();
        assert_eq!(json, "\"ea\"");
        let json = serde_json::to_string(&UnitId::FluidOunce).unwrap();
        assert_eq!(json, "\"fluid_oz\"");
    }
}
