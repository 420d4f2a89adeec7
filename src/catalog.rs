//! # Product Catalog
//!
//! This module loads the product catalog and answers the physical questions
//! the mass resolver asks about a product: how dense it is, what one item
//! weighs, how many items a bunch holds and how much a package contains.
//!
//! ## Parent composition
//!
//! An entry may describe itself as a blend of other entries through its
//! `super` map of `parent -> percentage` (per 100 of the product). Missing
//! specific gravity, mass and category values are computed as the
//! percentage-weighted sum over the parents, recursively. A 50/50 mix has
//! parents `{x: 50, y: 50}`; a concentrate may have `{x: 400}`.
//!
//! ## Validation
//!
//! Loading rejects the whole catalog at once: every entry must resolve a
//! mass, a specific gravity and at least one category value through its
//! ancestor chain, every parent must exist, and no parent chain may loop.

use crate::errors::CatalogError;
use crate::measurement_types::UnitId;
use anyhow::Context;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Items in a bunch when neither the product nor its single parent says
pub const DEFAULT_BUNCH_COUNT: f64 = 6.0;

/// Millilitres in a package when neither the product nor its single parent says
pub const DEFAULT_PKG_VOLUME_ML: f64 = 540.0;

/// Ancestor chains deeper than this are treated as broken data
pub const MAX_PARENT_DEPTH: usize = 32;

/// Mass and specific gravity of the placeholder product used when nothing matched
pub const PLACEHOLDER_MASS_G: f64 = 100.0;
pub const PLACEHOLDER_SG: f64 = 1.0;

/// Food value categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "ed")]
    EnergyDensity,
    #[serde(rename = "pd")]
    ProteinDensity,
    #[serde(rename = "of")]
    OilFat,
    #[serde(rename = "m")]
    Milk,
    #[serde(rename = "r")]
    Root,
    #[serde(rename = "fv")]
    FruitVeg,
    #[serde(rename = "s")]
    Sugar,
    #[serde(rename = "caf")]
    Caffeine,
    #[serde(rename = "coc")]
    Cocoa,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::EnergyDensity,
        Category::ProteinDensity,
        Category::OilFat,
        Category::Milk,
        Category::Root,
        Category::FruitVeg,
        Category::Sugar,
        Category::Caffeine,
        Category::Cocoa,
    ];

    /// Key used in the products document
    pub fn key(&self) -> &'static str {
        match self {
            Category::EnergyDensity => "ed",
            Category::ProteinDensity => "pd",
            Category::OilFat => "of",
            Category::Milk => "m",
            Category::Root => "r",
            Category::FruitVeg => "fv",
            Category::Sugar => "s",
            Category::Caffeine => "caf",
            Category::Cocoa => "coc",
        }
    }
}

/// Entry shape in the products document
#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    g: Option<f64>,
    sg: Option<f64>,
    #[serde(rename = "super")]
    parents: Option<BTreeMap<String, f64>>,
    bunch: Option<f64>,
    pkg: Option<f64>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

/// One product of the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Canonical name, the key of the entry in the catalog
    pub name: String,
    /// Mass of one item in grams
    pub mass_g: Option<f64>,
    pub specific_gravity: Option<f64>,
    /// Parent name to percentage of the parent per 100 of this product
    pub parents: BTreeMap<String, f64>,
    /// Items in one bunch
    pub bunch_count: Option<f64>,
    /// Millilitres in one package
    pub pkg_volume_ml: Option<f64>,
    pub category_values: BTreeMap<Category, f64>,
    /// Alternative names; the canonical name is always an alias of itself
    pub aliases: Vec<String>,
}

impl CatalogEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mass_g: None,
            specific_gravity: None,
            parents: BTreeMap::new(),
            bunch_count: None,
            pkg_volume_ml: None,
            category_values: BTreeMap::new(),
            aliases: Vec::new(),
        }
    }

    /// The product assumed when an ingredient matched nothing: 100 g, sg 1.0
    pub fn placeholder() -> Self {
        Self::new("")
            .with_mass(PLACEHOLDER_MASS_G)
            .with_specific_gravity(PLACEHOLDER_SG)
    }

    pub fn with_mass(mut self, grams: f64) -> Self {
        self.mass_g = Some(grams);
        self
    }

    pub fn with_specific_gravity(mut self, sg: f64) -> Self {
        self.specific_gravity = Some(sg);
        self
    }

    pub fn with_parent(mut self, parent: &str, percentage: f64) -> Self {
        self.parents.insert(parent.to_string(), percentage);
        self
    }

    pub fn with_bunch(mut self, count: f64) -> Self {
        self.bunch_count = Some(count);
        self
    }

    pub fn with_pkg(mut self, millilitres: f64) -> Self {
        self.pkg_volume_ml = Some(millilitres);
        self
    }

    pub fn with_category(mut self, category: Category, value: f64) -> Self {
        self.category_values.insert(category, value);
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Non-zero food values the entry states itself, without inheritance
    pub fn food_values(&self) -> BTreeMap<Category, f64> {
        self.category_values
            .iter()
            .filter(|(_, value)| **value != 0.0)
            .map(|(category, value)| (*category, *value))
            .collect()
    }

    /// The canonical name followed by every alias
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    fn from_raw(name: &str, raw: RawEntry) -> Self {
        let mut category_values = BTreeMap::new();
        for category in Category::ALL {
            if let Some(value) = raw.extra.get(category.key()).and_then(serde_json::Value::as_f64) {
                category_values.insert(category, value);
            }
        }
        Self {
            name: name.to_string(),
            mass_g: raw.g,
            specific_gravity: raw.sg,
            parents: raw.parents.unwrap_or_default(),
            bunch_count: raw.bunch,
            pkg_volume_ml: raw.pkg,
            category_values,
            aliases: raw.names,
        }
    }
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// The validated product catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    /// Build and validate a catalog from entries
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self, CatalogError> {
        let catalog = Self {
            entries: entries.into_iter().map(|e| (e.name.clone(), e)).collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a products document
    ///
    /// Top-level keys starting with `_` hold comments and are skipped.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut entries = Vec::with_capacity(document.len());
        for (name, value) in document {
            if name.starts_with('_') {
                continue;
            }
            let raw: RawEntry = serde_json::from_value(value)
                .map_err(|e| CatalogError::Format(format!("{name}: {e}")))?;
            entries.push(CatalogEntry::from_raw(&name, raw));
        }
        Self::from_entries(entries)
    }

    /// Load a products document from disk
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let catalog = Self::from_json(&json)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?;
        info!("Loaded {} catalog entries from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical name order
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Check the whole catalog, reporting a parent cycle first and otherwise
    /// every integrity problem at once
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(name) = self.find_cycle() {
            return Err(CatalogError::Cycle(name));
        }

        let mut problems = Vec::new();
        for entry in self.entries.values() {
            if entry.name.trim().is_empty() {
                problems.push("product name must not be blank".to_string());
                continue;
            }
            for parent in entry.parents.keys() {
                if !self.entries.contains_key(parent) {
                    problems.push(format!("{}: unknown parent '{}'", entry.name, parent));
                }
            }
            if nonzero(self.specific_gravity(entry)).is_none() {
                problems.push(format!("{}: no sg value found", entry.name));
            }
            if self.base_mass_g(entry) == 0.0 {
                problems.push(format!("{}: no g (mass) value found", entry.name));
            }
            if self.category_values(entry).is_empty() {
                problems.push(format!("{}: no category value found", entry.name));
            }
        }

        if problems.is_empty() {
            debug!("Catalog of {} entries validated", self.len());
            Ok(())
        } else {
            Err(CatalogError::Integrity(problems))
        }
    }

    /// Name of an entry whose parent chain leads back to itself
    fn find_cycle(&self) -> Option<String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(catalog: &'a Catalog, name: &'a str, marks: &mut HashMap<&'a str, Mark>) -> Option<String> {
            match marks.get(name) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => return Some(name.to_string()),
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            if let Some(entry) = catalog.entries.get(name) {
                for parent in entry.parents.keys() {
                    if let Some(found) = visit(catalog, parent, marks) {
                        return Some(found);
                    }
                }
            }
            marks.insert(name, Mark::Done);
            None
        }

        let mut marks = HashMap::new();
        self.entries.keys().find_map(|name| visit(self, name, &mut marks))
    }

    /// Parents of an entry that exist in the catalog, with their percentages
    fn resolved_parents<'a>(&'a self, entry: &'a CatalogEntry) -> impl Iterator<Item = (&'a CatalogEntry, f64)> {
        entry.parents.iter().filter_map(move |(name, percentage)| match self.entries.get(name) {
            Some(parent) => Some((parent, *percentage)),
            None => {
                warn!("{}: skipping unknown parent '{}'", entry.name, name);
                None
            }
        })
    }

    /// Specific gravity of an entry, from its parents when it has none of its own
    pub fn specific_gravity(&self, entry: &CatalogEntry) -> Option<f64> {
        self.specific_gravity_at(entry, 0)
    }

    fn specific_gravity_at(&self, entry: &CatalogEntry, depth: usize) -> Option<f64> {
        if let Some(sg) = nonzero(entry.specific_gravity) {
            return Some(sg);
        }
        if entry.parents.is_empty() {
            return entry.specific_gravity;
        }
        if depth >= MAX_PARENT_DEPTH {
            warn!("{}: parent chain too deep resolving sg", entry.name);
            return None;
        }
        let sg = self
            .resolved_parents(entry)
            .filter_map(|(parent, pct)| self.specific_gravity_at(parent, depth + 1).map(|sg| sg * pct / 100.0))
            .sum();
        Some(sg)
    }

    /// Mass of one item in grams, from its parents when it has none of its own;
    /// 0.0 when nothing in the ancestor chain says
    pub fn base_mass_g(&self, entry: &CatalogEntry) -> f64 {
        self.base_mass_at(entry, 0)
    }

    fn base_mass_at(&self, entry: &CatalogEntry, depth: usize) -> f64 {
        if let Some(grams) = nonzero(entry.mass_g) {
            return grams;
        }
        if depth >= MAX_PARENT_DEPTH {
            warn!("{}: parent chain too deep resolving mass", entry.name);
            return 0.0;
        }
        self.resolved_parents(entry)
            .map(|(parent, pct)| self.base_mass_at(parent, depth + 1) * pct / 100.0)
            .sum()
    }

    /// Convert `bunch` and `pkg` quantities to `ea` and `ml`
    ///
    /// The entry's own bunch count or package volume wins; otherwise an entry
    /// with exactly one parent asks that parent; otherwise the defaults of 6
    /// items per bunch and 540 ml per package apply. Other units pass through.
    pub fn unbundle(&self, entry: &CatalogEntry, quantity: f64, unit: UnitId) -> (f64, UnitId) {
        self.unbundle_at(entry, quantity, unit, 0)
    }

    fn unbundle_at(&self, entry: &CatalogEntry, quantity: f64, unit: UnitId, depth: usize) -> (f64, UnitId) {
        let (own, default, target) = match unit {
            UnitId::Bunch => (entry.bunch_count, DEFAULT_BUNCH_COUNT, UnitId::Each),
            UnitId::Pkg => (entry.pkg_volume_ml, DEFAULT_PKG_VOLUME_ML, UnitId::Ml),
            _ => return (quantity, unit),
        };

        if let Some(size) = nonzero(own) {
            return (quantity * size, target);
        }
        if entry.parents.len() == 1 && depth < MAX_PARENT_DEPTH {
            if let Some((parent, _)) = self.resolved_parents(entry).next() {
                return self.unbundle_at(parent, quantity, unit, depth + 1);
            }
        }
        debug!("{}: default {} size applied", entry.name, unit);
        (quantity * default, target)
    }

    /// Food values per category, from its parents' composition when the entry
    /// has none of its own
    pub fn category_values(&self, entry: &CatalogEntry) -> BTreeMap<Category, f64> {
        self.category_values_at(entry, 0)
    }

    fn category_values_at(&self, entry: &CatalogEntry, depth: usize) -> BTreeMap<Category, f64> {
        let own = entry.food_values();
        if !own.is_empty() || depth >= MAX_PARENT_DEPTH {
            return own;
        }

        let mut values = BTreeMap::new();
        for (parent, pct) in self.resolved_parents(entry) {
            for (category, value) in self.category_values_at(parent, depth + 1) {
                *values.entry(category).or_insert(0.0) += value * pct / 100.0;
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_and_pulses() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new("water")
                .with_mass(250.0)
                .with_specific_gravity(1.0)
                .with_category(Category::EnergyDensity, 1.0),
            CatalogEntry::new("pulses")
                .with_mass(100.0)
                .with_specific_gravity(0.85)
                .with_category(Category::OilFat, 0.5)
                .with_category(Category::FruitVeg, 0.4),
        ]
    }

    fn catalog_with(extra: Vec<CatalogEntry>) -> Catalog {
        let mut entries = water_and_pulses();
        entries.extend(extra);
        Catalog::from_entries(entries).unwrap()
    }

    #[test]
    fn test_specific_gravity_from_parents() {
        let catalog = catalog_with(vec![
            CatalogEntry::new("all water").with_parent("water", 100.0),
            CatalogEntry::new("half water").with_parent("water", 50.0),
            CatalogEntry::new("concentrate").with_parent("water", 200.0),
            CatalogEntry::new("blend").with_parent("water", 60.0).with_parent("pulses", 40.0),
        ]);
        let sg = |name: &str| catalog.specific_gravity(catalog.get(name).unwrap()).unwrap();
        assert_eq!(sg("all water"), 1.0);
        assert_eq!(sg("half water"), 0.5);
        assert_eq!(sg("concentrate"), 2.0);
        assert!((sg("blend") - 0.94).abs() < 1e-9);
    }

    #[test]
    fn test_base_mass_from_parents() {
        let catalog = catalog_with(vec![
            CatalogEntry::new("half water").with_parent("water", 50.0),
            CatalogEntry::new("blend").with_parent("water", 60.0).with_parent("pulses", 40.0),
        ]);
        let g = |name: &str| catalog.base_mass_g(catalog.get(name).unwrap());
        assert_eq!(g("half water"), 125.0);
        assert!((g("blend") - 190.0).abs() < 1e-9);
        assert_eq!(g("water"), 250.0);
    }

    #[test]
    fn test_category_values_from_parents() {
        let catalog = catalog_with(vec![
            CatalogEntry::new("half pulses").with_parent("pulses", 50.0),
            CatalogEntry::new("mix").with_parent("pulses", 50.0).with_parent("water", 50.0),
        ]);
        let values = catalog.category_values(catalog.get("half pulses").unwrap());
        assert_eq!(values.get(&Category::OilFat), Some(&0.25));
        assert_eq!(values.get(&Category::FruitVeg), Some(&0.2));

        let mix = catalog.get("mix").unwrap();
        assert!(mix.food_values().is_empty());
        let values = catalog.category_values(mix);
        assert_eq!(values.len(), 3);
        assert_eq!(values.get(&Category::EnergyDensity), Some(&0.5));
    }

    #[test]
    fn test_unbundle() {
        let catalog = catalog_with(vec![
            CatalogEntry::new("sized").with_parent("water", 100.0).with_bunch(10.0).with_pkg(125.0),
            CatalogEntry::new("child").with_parent("sized", 100.0),
        ]);
        let water = catalog.get("water").unwrap();
        assert_eq!(catalog.unbundle(water, 2.0, UnitId::Bunch), (12.0, UnitId::Each));
        assert_eq!(catalog.unbundle(water, 2.0, UnitId::Pkg), (1080.0, UnitId::Ml));
        assert_eq!(catalog.unbundle(water, 2.0, UnitId::Cup), (2.0, UnitId::Cup));

        let child = catalog.get("child").unwrap();
        assert_eq!(catalog.unbundle(child, 2.0, UnitId::Bunch), (20.0, UnitId::Each));
        assert_eq!(catalog.unbundle(child, 2.0, UnitId::Pkg), (250.0, UnitId::Ml));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "_comment": {"note": "ignored"},
            "potatoes": {"g": 213, "sg": 0.75, "r": 1.0, "names": ["potato", "sweet potato"]},
            "fries": {"super": {"potatoes": 100}, "pkg": 450}
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        let potatoes = catalog.get("potatoes").unwrap();
        assert_eq!(potatoes.all_names().collect::<Vec<_>>(), vec!["potatoes", "potato", "sweet potato"]);
        assert_eq!(potatoes.category_values.get(&Category::Root), Some(&1.0));
        let fries = catalog.get("fries").unwrap();
        assert_eq!(fries.pkg_volume_ml, Some(450.0));
        assert_eq!(catalog.base_mass_g(fries), 213.0);
    }

    #[test]
    fn test_integrity_problems_are_collected() {
        let json = r#"{
            "nothing": {"names": ["void"]},
            "orphan": {"super": {"missing": 100}, "g": 10, "sg": 1.0, "ed": 1}
        }"#;
        match Catalog::from_json(json) {
            Err(CatalogError::Integrity(problems)) => {
                assert!(problems.contains(&"nothing: no sg value found".to_string()));
                assert!(problems.contains(&"nothing: no g (mass) value found".to_string()));
                assert!(problems.contains(&"nothing: no category value found".to_string()));
                assert!(problems.contains(&"orphan: unknown parent 'missing'".to_string()));
            }
            other => panic!("Expected integrity error, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_is_rejected() {
        let entries = vec![
            CatalogEntry::new("a").with_parent("b", 100.0),
            CatalogEntry::new("b").with_parent("a", 100.0),
        ];
        assert!(matches!(Catalog::from_entries(entries), Err(CatalogError::Cycle(_))));
    }

    #[test]
    fn test_placeholder() {
        let placeholder = CatalogEntry::placeholder();
        let catalog = Catalog::default();
        assert_eq!(catalog.base_mass_g(&placeholder), 100.0);
        assert_eq!(catalog.specific_gravity(&placeholder), Some(1.0));
    }
}
