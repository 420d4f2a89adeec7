//! # Impact Module
//!
//! Greenhouse-gas emission factors per origin, and the footprint of an
//! ingredient in grams of CO2 equivalent.
//!
//! ## Origins document
//!
//! A JSON object keyed by origin. Each origin maps product names to four
//! emission factors (grams CO2e per gram of product) and may name the origin
//! it inherits missing products from under `"super"`:
//!
//! ```json
//! {
//!   "global": { "potatoes": [0.1, 0.46, 0.3, 0.8] },
//!   "fr": { "super": "global", "potatoes": [0.1, 0.3, 0.25, 0.6] }
//! }
//! ```
//!
//! ## Efficiency
//!
//! A product's GHG efficiency in a food category is its stated food value
//! divided by its mean emission factor. The baseline of a category in an
//! origin is the best efficiency any product reaches there, or the runner-up
//! once more than six products compete. A product's efficiency ratio compares
//! it against that baseline; products without food values of their own
//! average their parents' ratios by share.

use crate::catalog::{Catalog, CatalogEntry, Category, MAX_PARENT_DEPTH};
use crate::errors::OriginError;
use crate::ingredient_model::Ingredient;
use crate::mass::mass;
use anyhow::Context;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Categories with at most this many competing products take the best
/// efficiency as their baseline; larger ones take the runner-up
pub const BASELINE_TOP_PICK_MAX: usize = 6;

/// Which of an origin's emission factors to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhgFlavor {
    P10,
    Mean,
    Median,
    P90,
}

impl GhgFlavor {
    fn index(&self) -> usize {
        match self {
            GhgFlavor::P10 => 0,
            GhgFlavor::Mean => 1,
            GhgFlavor::Median => 2,
            GhgFlavor::P90 => 3,
        }
    }
}

/// Emission factors of one product: p10, mean, median, p90
pub type EmissionFactors = [f64; 4];

#[derive(Debug, Clone, Default, Deserialize)]
struct OriginFactors {
    #[serde(rename = "super", default)]
    parent: Option<String>,
    #[serde(flatten)]
    products: BTreeMap<String, EmissionFactors>,
}

/// Emission factor tables keyed by origin, with single-parent inheritance
#[derive(Debug, Clone, Default)]
pub struct OriginTable {
    origins: BTreeMap<String, OriginFactors>,
}

impl OriginTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an origin, inheriting from `parent` when given
    pub fn with_origin(mut self, origin: &str, parent: Option<&str>) -> Self {
        self.origins.entry(origin.to_string()).or_default().parent = parent.map(str::to_string);
        self
    }

    pub fn with_factors(mut self, origin: &str, product: &str, factors: EmissionFactors) -> Self {
        self.origins
            .entry(origin.to_string())
            .or_default()
            .products
            .insert(product.to_string(), factors);
        self
    }

    /// Parse and validate an origins document
    pub fn from_json(json: &str) -> Result<Self, OriginError> {
        let origins: BTreeMap<String, OriginFactors> = serde_json::from_str(json)?;
        let table = Self { origins };
        table.validate()?;
        Ok(table)
    }

    /// Load an origins document from disk
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read origins from {}", path.display()))?;
        let table = Self::from_json(&json).with_context(|| format!("Invalid origins in {}", path.display()))?;
        info!("Loaded {} origins from {}", table.origins.len(), path.display());
        Ok(table)
    }

    /// Check that every parent exists and no origin inherits from itself
    pub fn validate(&self) -> Result<(), OriginError> {
        for name in self.origins.keys() {
            self.chain(name)?;
        }
        Ok(())
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.contains_key(origin)
    }

    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.origins.keys().map(String::as_str)
    }

    /// The origin followed by the origins it inherits from
    fn chain(&self, origin: &str) -> Result<Vec<&OriginFactors>, OriginError> {
        let mut chain = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        let mut current = Some(origin);
        while let Some(name) = current {
            if seen.contains(&name) {
                return Err(OriginError::Cycle(origin.to_string()));
            }
            let factors = self
                .origins
                .get(name)
                .ok_or_else(|| OriginError::UnknownOrigin(name.to_string()))?;
            seen.push(name);
            chain.push(factors);
            current = factors.parent.as_deref();
        }
        Ok(chain)
    }

    /// Emission factors of a product in an origin, inherited when the origin
    /// does not list the product
    pub fn factors(&self, origin: &str, product: &str) -> Result<Option<EmissionFactors>, OriginError> {
        Ok(self
            .chain(origin)?
            .into_iter()
            .find_map(|factors| factors.products.get(product).copied()))
    }

    pub fn ghg_value(&self, origin: &str, product: &str, flavor: GhgFlavor) -> Result<Option<f64>, OriginError> {
        Ok(self.factors(origin, product)?.map(|factors| factors[flavor.index()]))
    }
}

/// Emission factor of a catalog entry
///
/// Entries the origin does not list take the percentage-weighted sum of
/// their parents' factors.
pub fn ghg_value(
    catalog: &Catalog,
    origins: &OriginTable,
    entry: &CatalogEntry,
    origin: &str,
    flavor: GhgFlavor,
) -> Result<Option<f64>, OriginError> {
    ghg_value_at(catalog, origins, entry, origin, flavor, 0)
}

fn ghg_value_at(
    catalog: &Catalog,
    origins: &OriginTable,
    entry: &CatalogEntry,
    origin: &str,
    flavor: GhgFlavor,
    depth: usize,
) -> Result<Option<f64>, OriginError> {
    let value = origins.ghg_value(origin, &entry.name, flavor)?;
    if value.is_some() || entry.parents.is_empty() {
        return Ok(value);
    }
    if depth >= MAX_PARENT_DEPTH {
        warn!("{}: parent chain too deep resolving emission factor", entry.name);
        return Ok(None);
    }

    let mut total = 0.0;
    for (name, percentage) in &entry.parents {
        let Some(parent) = catalog.get(name) else {
            warn!("{}: skipping unknown parent '{}'", entry.name, name);
            continue;
        };
        if let Some(parent_value) = ghg_value_at(catalog, origins, parent, origin, flavor, depth + 1)? {
            total += parent_value * percentage / 100.0;
        }
    }
    Ok(Some(total))
}

/// Footprint of an ingredient in grams CO2e, rounded to two decimals
///
/// # Returns
///
/// `Some(0.0)` when the ingredient matched no product, `None` when the
/// product has no non-zero mean emission factor in the origin.
///
/// # Errors
///
/// [`OriginError::UnknownOrigin`] when the origin, or one it inherits from,
/// is not in the table.
pub fn impact(
    catalog: &Catalog,
    origins: &OriginTable,
    ingredient: &Ingredient,
    origin: &str,
) -> Result<Option<f64>, OriginError> {
    let Some(entry) = ingredient.product.as_ref().and_then(|p| catalog.get(&p.name)) else {
        return Ok(Some(0.0));
    };

    let grams = mass(catalog, entry, ingredient);
    let result = match ghg_value(catalog, origins, entry, origin, GhgFlavor::Mean)? {
        Some(mean) if mean != 0.0 => Some(round_to_cents(mean * grams)),
        _ => None,
    };
    debug!("{}: {} g in {} -> {:?} g CO2e", entry.name, grams, origin, result);
    Ok(result)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Food value per unit of mean emissions for each category the entry states
/// itself; empty when the entry has no non-zero mean factor in the origin
pub fn ghg_efficiencies(
    catalog: &Catalog,
    origins: &OriginTable,
    entry: &CatalogEntry,
    origin: &str,
) -> Result<BTreeMap<Category, f64>, OriginError> {
    match ghg_value(catalog, origins, entry, origin, GhgFlavor::Mean)? {
        Some(mean) if mean != 0.0 => Ok(entry
            .food_values()
            .into_iter()
            .map(|(category, value)| (category, value / mean))
            .collect()),
        _ => Ok(BTreeMap::new()),
    }
}

/// Every non-zero efficiency in the catalog per origin and category, best first
///
/// Origins whose inheritance chain is broken are skipped.
pub fn expanded_baselines(catalog: &Catalog, origins: &OriginTable) -> BTreeMap<String, BTreeMap<Category, Vec<f64>>> {
    let mut expanded = BTreeMap::new();
    for origin in origins.origins() {
        let mut per_category: BTreeMap<Category, Vec<f64>> = BTreeMap::new();
        for entry in catalog.entries() {
            let efficiencies = match ghg_efficiencies(catalog, origins, entry, origin) {
                Ok(efficiencies) => efficiencies,
                Err(e) => {
                    warn!("Skipping baselines for origin '{}': {}", origin, e);
                    per_category.clear();
                    break;
                }
            };
            for (category, value) in efficiencies {
                if value != 0.0 {
                    per_category.entry(category).or_default().push(value);
                }
            }
        }
        for values in per_category.values_mut() {
            values.sort_by(|a, b| b.total_cmp(a));
        }
        expanded.insert(origin.to_string(), per_category);
    }
    expanded
}

/// Reference efficiency per origin and category
///
/// `None` for a category only one product reaches, where no comparison is
/// meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EfficiencyBaselines {
    baselines: BTreeMap<String, BTreeMap<Category, Option<f64>>>,
}

impl EfficiencyBaselines {
    pub fn compute(catalog: &Catalog, origins: &OriginTable) -> Self {
        Self::from_expanded(&expanded_baselines(catalog, origins))
    }

    /// Pick each category's baseline from its sorted efficiencies
    pub fn from_expanded(expanded: &BTreeMap<String, BTreeMap<Category, Vec<f64>>>) -> Self {
        let baselines = expanded
            .iter()
            .map(|(origin, categories)| {
                let picked = categories
                    .iter()
                    .map(|(category, values)| {
                        let baseline = match values.len() {
                            0 | 1 => None,
                            n if n <= BASELINE_TOP_PICK_MAX => Some(values[0]),
                            _ => Some(values[1]),
                        };
                        (*category, baseline)
                    })
                    .collect();
                (origin.clone(), picked)
            })
            .collect();
        Self { baselines }
    }

    /// Baselines of one origin
    pub fn for_origin(&self, origin: &str) -> Option<&BTreeMap<Category, Option<f64>>> {
        self.baselines.get(origin)
    }

    pub fn baseline(&self, origin: &str, category: Category) -> Option<f64> {
        self.baselines.get(origin)?.get(&category).copied().flatten()
    }
}

/// Ratio of an entry's efficiency to its category baseline
///
/// The entry's first stated category decides. An entry without food values
/// of its own takes the share-weighted mean of its parents' ratios, ignoring
/// parents without one.
///
/// # Returns
///
/// `None` when no baseline applies anywhere in the ancestor chain.
pub fn ghg_efficiency_ratio(
    catalog: &Catalog,
    origins: &OriginTable,
    baselines: &EfficiencyBaselines,
    entry: &CatalogEntry,
    origin: &str,
) -> Result<Option<f64>, OriginError> {
    efficiency_ratio_at(catalog, origins, baselines, entry, origin, 0)
}

fn efficiency_ratio_at(
    catalog: &Catalog,
    origins: &OriginTable,
    baselines: &EfficiencyBaselines,
    entry: &CatalogEntry,
    origin: &str,
    depth: usize,
) -> Result<Option<f64>, OriginError> {
    let efficiencies = ghg_efficiencies(catalog, origins, entry, origin)?;
    if let Some((category, efficiency)) = efficiencies.into_iter().next() {
        return Ok(baselines.baseline(origin, category).map(|baseline| efficiency / baseline));
    }
    if depth >= MAX_PARENT_DEPTH {
        warn!("{}: parent chain too deep resolving efficiency", entry.name);
        return Ok(None);
    }

    let mut weighted = 0.0;
    let mut shares = 0.0;
    for (name, share) in &entry.parents {
        let Some(parent) = catalog.get(name) else {
            continue;
        };
        if let Some(ratio) = efficiency_ratio_at(catalog, origins, baselines, parent, origin, depth + 1)? {
            weighted += ratio * share;
            shares += share;
        }
    }
    Ok((shares > 0.0).then(|| weighted / shares))
}
