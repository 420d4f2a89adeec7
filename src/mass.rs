//! # Mass Resolution
//!
//! Converts the amounts of a parsed ingredient into one mass in grams, using
//! the matched catalog entry for density, item mass and container sizes.
//!
//! ## Resolution order
//!
//! - Each amount is converted on its own: mass units to grams, volume units to
//!   grams through the entry's specific gravity, and counts through their
//!   first clarifying qualifier ("2 (6-ounce) cans" is 12 ounces)
//! - A leading count that no qualifier clarified looks for a later mass or
//!   volume amount ("1 salmon, about 4 1/2 pounds"), then falls back to the
//!   catalog: packages and bunches are unbundled and items weighed
//! - Otherwise mass amounts and volume amounts are totalled separately and
//!   the mass total wins when it is non-zero

use crate::catalog::{Catalog, CatalogEntry};
use crate::ingredient_model::{Amount, Ingredient};
use crate::measurement_types::{to_metric, UnitId, UnitKind};
use log::{debug, trace};

/// What a converted amount measures
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    /// Grams
    Mass,
    /// Millilitres, or grams when a specific gravity was applied
    Volume,
    /// Items still counted in the given unit
    Count(UnitId),
}

/// One amount after conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertedAmount {
    pub value: f64,
    pub measure: Measure,
    /// Added to the amounts before it
    pub plus: bool,
    /// Applies to each counted item
    pub per_each: bool,
}

fn measure_of(unit: UnitId) -> Measure {
    match unit.kind() {
        UnitKind::Mass => Measure::Mass,
        UnitKind::Volume => Measure::Volume,
        UnitKind::Count => Measure::Count(unit),
    }
}

/// Convert a single amount
///
/// Counts (`ea`, `pkg`, `bunch`) use their first qualifier with a unit other
/// than `ea`, multiplied by the count when the qualifier is per each. An
/// `ea` qualifier per each multiplies the count itself ("2 packs of 4 each"
/// is 8 items); other `ea` qualifiers are ignored.
///
/// # Examples
///
/// ```rust
/// use ghgi::ingredient_model::Amount;
/// use ghgi::mass::{mass_for_entry, Measure};
/// use ghgi::measurement_types::UnitId;
///
/// let cans = Amount::new(2.0, UnitId::Pkg).with_qualifier(Amount::new(6.0, UnitId::Ounce).per_each());
/// let converted = mass_for_entry(None, &cans);
/// assert_eq!(converted.measure, Measure::Mass);
/// assert!((converted.value - 340.194).abs() < 1e-9);
/// ```
pub fn mass_for_entry(specific_gravity: Option<f64>, amount: &Amount) -> ConvertedAmount {
    let converted = |value: f64, unit: UnitId| ConvertedAmount {
        value: to_metric(value, unit, specific_gravity),
        measure: measure_of(unit),
        plus: amount.is_plus,
        per_each: amount.per_each,
    };

    if !amount.unit.is_count() {
        return converted(amount.quantity, amount.unit);
    }

    let mut count = amount.quantity;
    for qualifier in &amount.qualifiers {
        if qualifier.unit == UnitId::Each {
            if qualifier.per_each {
                count *= qualifier.quantity;
            }
            continue;
        }
        let value = if qualifier.per_each {
            count * qualifier.quantity
        } else {
            qualifier.quantity
        };
        trace!("{} clarified by qualifier {}", amount, qualifier);
        return converted(value, qualifier.unit);
    }

    converted(count, amount.unit)
}

/// Mass of an ingredient in grams, measured as the given catalog entry
///
/// # Arguments
///
/// * `catalog` - Catalog the entry belongs to, for ancestor traversal
/// * `entry` - The matched entry, or [`CatalogEntry::placeholder`]
/// * `ingredient` - The parsed ingredient
pub fn mass(catalog: &Catalog, entry: &CatalogEntry, ingredient: &Ingredient) -> f64 {
    let specific_gravity = catalog.specific_gravity(entry);
    let converted: Vec<ConvertedAmount> = ingredient
        .flat_amounts()
        .iter()
        .map(|amount| mass_for_entry(specific_gravity, amount))
        .collect();

    let Some(first) = converted.first() else {
        return 0.0;
    };

    if let Measure::Count(unit) = first.measure {
        let count = first.value;
        let clarified = converted[1..]
            .iter()
            .find(|c| matches!(c.measure, Measure::Mass | Measure::Volume));
        if let Some(clarification) = clarified {
            debug!("{}: count clarified by a later amount", entry.name);
            return if clarification.per_each {
                count * clarification.value
            } else {
                clarification.value
            };
        }

        let (quantity, unit) = catalog.unbundle(entry, count, unit);
        let quantity = if unit == UnitId::Each {
            quantity * catalog.base_mass_g(entry)
        } else {
            quantity
        };
        return to_metric(quantity, unit, specific_gravity);
    }

    let mut mass_total = 0.0;
    let mut volume_total = 0.0;
    let mut plus = false;
    for c in &converted {
        plus |= c.plus;
        match c.measure {
            Measure::Mass if plus || mass_total == 0.0 => mass_total += c.value,
            Measure::Volume if plus || volume_total == 0.0 => volume_total += c.value,
            _ => {}
        }
    }

    if volume_total != 0.0 && ingredient.has_modifier("grated") {
        volume_total /= 2.0;
    }

    if mass_total == 0.0 {
        volume_total
    } else {
        mass_total
    }
}
