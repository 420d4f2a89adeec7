//! # Repository Module
//!
//! The read-only datasets every estimate needs (catalog, matching index and
//! emission factors), constructed once and shared by reference, plus a
//! process-wide cache that loads them on first use.

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::{DatasetConfig, DEFAULT_ORIGIN};
use crate::errors::OriginError;
use crate::gin::{GinIndex, GinMatch};
use crate::impact::{ghg_efficiency_ratio, impact, EfficiencyBaselines, OriginTable};
use crate::ingredient_model::{Ingredient, IngredientRecord, ParseOutcome};
use crate::ingredient_parser::{parse_ingredient_line, parse_ingredient_list};
use crate::mass::mass;
use anyhow::bail;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Mass and footprint of one parsed ingredient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    #[serde(flatten)]
    pub record: IngredientRecord,
    /// Canonical name of the matched product
    pub product: Option<String>,
    /// Alias the product was matched through
    pub alias: Option<String>,
    pub match_confidence: f64,
    pub mass_g: f64,
    /// Grams CO2e, `None` when the product has no emission factor
    pub impact: Option<f64>,
    /// Product efficiency against its category baseline
    pub efficiency_ratio: Option<f64>,
}

/// Catalog, matching index and emission factors
#[derive(Debug)]
pub struct Repository {
    catalog: Catalog,
    gin: GinIndex,
    origins: OriginTable,
    baselines: EfficiencyBaselines,
    default_origin: String,
    placeholder: CatalogEntry,
}

impl Repository {
    pub fn new(catalog: Catalog, gin: GinIndex, origins: OriginTable) -> Self {
        let baselines = EfficiencyBaselines::compute(&catalog, &origins);
        Self {
            catalog,
            gin,
            origins,
            baselines,
            default_origin: DEFAULT_ORIGIN.to_string(),
            placeholder: CatalogEntry::placeholder(),
        }
    }

    pub fn with_default_origin(mut self, origin: &str) -> Self {
        self.default_origin = origin.to_string();
        self
    }

    /// Load every dataset named by the configuration
    ///
    /// The matching index is read from disk when both index paths are set and
    /// built from the catalog when neither is. An unknown default origin
    /// falls back to `global` when the table has it.
    ///
    /// # Errors
    ///
    /// Returns an error when a file cannot be read, a document is malformed,
    /// the catalog fails validation, or only one index path is configured.
    pub fn load(config: &DatasetConfig) -> anyhow::Result<Self> {
        let catalog = Catalog::load(&config.products_path)?;

        let gin = match (&config.gin_index_path, &config.aka_index_path) {
            (Some(gin_path), Some(aka_path)) => GinIndex::load(gin_path, aka_path)?,
            (None, None) => GinIndex::build(&catalog),
            _ => bail!("Both the stem index and the alias index paths must be set, or neither"),
        };

        let origins = OriginTable::load(&config.origins_path)?;
        let mut default_origin = config.default_origin.as_str();
        if !origins.contains(default_origin) {
            if !origins.contains(DEFAULT_ORIGIN) {
                bail!(OriginError::UnknownOrigin(default_origin.to_string()));
            }
            warn!("Unknown origin '{}', using '{}'", default_origin, DEFAULT_ORIGIN);
            default_origin = DEFAULT_ORIGIN;
        }

        info!(
            "Repository ready: {} products, {} aliases, default origin '{}'",
            catalog.len(),
            gin.len(),
            default_origin
        );
        Ok(Self::new(catalog, gin, origins).with_default_origin(default_origin))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn gin(&self) -> &GinIndex {
        &self.gin
    }

    pub fn origins(&self) -> &OriginTable {
        &self.origins
    }

    pub fn baselines(&self) -> &EfficiencyBaselines {
        &self.baselines
    }

    pub fn default_origin(&self) -> &str {
        &self.default_origin
    }

    pub fn match_name(&self, name: &str) -> Option<GinMatch> {
        self.gin.match_name(name)
    }

    /// Match the ingredient's names against the catalog, recording the
    /// product and confidence on it
    pub fn itemize(&self, ingredient: &mut Ingredient) {
        match self.gin.lookup(ingredient) {
            Some((product, confidence)) => {
                ingredient.product = Some(product);
                ingredient.match_confidence = confidence;
            }
            None => {
                debug!("No product for '{}'", ingredient.names().join(", "));
                ingredient.product = None;
                ingredient.match_confidence = 0.0;
            }
        }
    }

    /// The catalog entry of the ingredient's product, or the placeholder
    pub fn entry_for(&self, ingredient: &Ingredient) -> &CatalogEntry {
        ingredient
            .product
            .as_ref()
            .and_then(|product| self.catalog.get(&product.name))
            .unwrap_or(&self.placeholder)
    }

    /// Mass in grams, against the placeholder product when nothing matched
    pub fn mass(&self, ingredient: &Ingredient) -> f64 {
        mass(&self.catalog, self.entry_for(ingredient), ingredient)
    }

    /// Footprint in grams CO2e; `origin` defaults to the repository's
    pub fn impact(&self, ingredient: &Ingredient, origin: Option<&str>) -> Result<Option<f64>, OriginError> {
        impact(
            &self.catalog,
            &self.origins,
            ingredient,
            origin.unwrap_or(&self.default_origin),
        )
    }

    /// Efficiency ratio of the matched product; `None` when nothing matched
    pub fn efficiency_ratio(&self, ingredient: &Ingredient, origin: Option<&str>) -> Result<Option<f64>, OriginError> {
        let Some(entry) = ingredient.product.as_ref().and_then(|p| self.catalog.get(&p.name)) else {
            return Ok(None);
        };
        ghg_efficiency_ratio(
            &self.catalog,
            &self.origins,
            &self.baselines,
            entry,
            origin.unwrap_or(&self.default_origin),
        )
    }

    /// Parse, match and estimate one ingredient line
    ///
    /// # Returns
    ///
    /// One estimate per alternative ingredient on the line; none for a
    /// disregarded line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ghgi::catalog::{Catalog, CatalogEntry, Category};
    /// use ghgi::gin::GinIndex;
    /// use ghgi::impact::OriginTable;
    /// use ghgi::repository::Repository;
    ///
    /// let catalog = Catalog::from_entries(vec![CatalogEntry::new("flour")
    ///     .with_mass(125.0)
    ///     .with_specific_gravity(0.55)
    ///     .with_category(Category::EnergyDensity, 3.6)])
    /// .unwrap();
    /// let gin = GinIndex::build(&catalog);
    /// let origins = OriginTable::new()
    ///     .with_origin("global", None)
    ///     .with_factors("global", "flour", [0.5, 1.0, 0.9, 1.6]);
    /// let repository = Repository::new(catalog, gin, origins);
    ///
    /// let estimates = repository.estimate_line("100 g flour", None).unwrap();
    /// assert_eq!(estimates[0].product.as_deref(), Some("flour"));
    /// assert_eq!(estimates[0].impact, Some(100.0));
    /// ```
    pub fn estimate_line(&self, line: &str, origin: Option<&str>) -> Result<Vec<Estimate>, OriginError> {
        match parse_ingredient_line(line) {
            ParseOutcome::Parsed(ingredients) => self.estimate_all(ingredients, origin),
            ParseOutcome::Disregarded(_) => Ok(Vec::new()),
        }
    }

    /// Estimate every ingredient of a recipe's ingredient list, skipping
    /// headers and non-ingredient sections
    pub fn estimate_recipe(&self, text: &str, origin: Option<&str>) -> Result<Vec<Estimate>, OriginError> {
        self.estimate_all(parse_ingredient_list(text).ingredients, origin)
    }

    fn estimate_all(&self, ingredients: Vec<Ingredient>, origin: Option<&str>) -> Result<Vec<Estimate>, OriginError> {
        let mut estimates = Vec::with_capacity(ingredients.len());
        for mut ingredient in ingredients {
            self.itemize(&mut ingredient);
            estimates.push(Estimate {
                record: ingredient.to_record(),
                product: ingredient.product.as_ref().map(|p| p.name.clone()),
                alias: ingredient.product.as_ref().map(|p| p.alias.clone()),
                match_confidence: ingredient.match_confidence,
                mass_g: self.mass(&ingredient),
                impact: self.impact(&ingredient, origin)?,
                efficiency_ratio: self.efficiency_ratio(&ingredient, origin)?,
            });
        }
        Ok(estimates)
    }
}

/// Loads a [`Repository`] once and hands out shared handles to it
///
/// The lock is held while loading, so concurrent first callers wait for a
/// single load instead of racing.
pub struct RepositoryCache {
    repository: Mutex<Option<Arc<Repository>>>,
}

impl RepositoryCache {
    pub fn new() -> Self {
        Self {
            repository: Mutex::new(None),
        }
    }

    /// The cached repository, loading it from `config` on first call
    ///
    /// Later calls return the first repository regardless of `config`.
    pub fn get_or_load(&self, config: &DatasetConfig) -> anyhow::Result<Arc<Repository>> {
        let mut cached = self.repository.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(repository) = cached.as_ref() {
            return Ok(Arc::clone(repository));
        }

        log::info!("Loading repository from {}", config.products_path.display());
        let repository = Arc::new(Repository::load(config)?);
        *cached = Some(Arc::clone(&repository));
        Ok(repository)
    }

    pub fn is_loaded(&self) -> bool {
        self.repository.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Drop the cached repository so the next call reloads
    pub fn clear(&self) {
        let mut cached = self.repository.lock().unwrap_or_else(PoisonError::into_inner);
        if cached.take().is_some() {
            log::info!("Cleared cached repository");
        }
    }
}

impl Default for RepositoryCache {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref SHARED: RepositoryCache = RepositoryCache::new();
}

/// The process-wide repository, loaded from `config` on first use
pub fn shared_repository(config: &DatasetConfig) -> anyhow::Result<Arc<Repository>> {
    SHARED.get_or_load(config)
}
