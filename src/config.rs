//! # Dataset Configuration Module
//!
//! This module defines where the catalog, the matching indexes and the
//! emission factor tables are read from, and which origin impact estimates
//! use when none is given.

use std::env;
use std::path::PathBuf;

// Default dataset locations, relative to the working directory
pub const DEFAULT_PRODUCTS_PATH: &str = "data/products.json";
pub const DEFAULT_ORIGINS_PATH: &str = "data/origins.json";
pub const DEFAULT_ORIGIN: &str = "global";

// Environment variables overriding the defaults
pub const PRODUCTS_ENV: &str = "GHGI_PRODUCTS";
pub const GIN_INDEX_ENV: &str = "GHGI_GIN_INDEX";
pub const AKA_INDEX_ENV: &str = "GHGI_AKA_INDEX";
pub const ORIGINS_ENV: &str = "GHGI_ORIGINS";
pub const ORIGIN_ENV: &str = "GHGI_ORIGIN";

/// Dataset locations and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Product catalog (JSON object of canonical name to entry)
    pub products_path: PathBuf,
    /// Persisted stem index; built from the catalog when absent
    pub gin_index_path: Option<PathBuf>,
    /// Persisted alias index; built from the catalog when absent
    pub aka_index_path: Option<PathBuf>,
    /// Emission factor tables keyed by origin
    pub origins_path: PathBuf,
    /// Origin used when a caller does not name one
    pub default_origin: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            products_path: PathBuf::from(DEFAULT_PRODUCTS_PATH),
            gin_index_path: None,
            aka_index_path: None,
            origins_path: PathBuf::from(DEFAULT_ORIGINS_PATH),
            default_origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl DatasetConfig {
    /// Build a configuration from `GHGI_*` environment variables, falling back
    /// to the defaults for unset ones
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            products_path: env::var_os(PRODUCTS_ENV).map(PathBuf::from).unwrap_or(defaults.products_path),
            gin_index_path: env::var_os(GIN_INDEX_ENV).map(PathBuf::from),
            aka_index_path: env::var_os(AKA_INDEX_ENV).map(PathBuf::from),
            origins_path: env::var_os(ORIGINS_ENV).map(PathBuf::from).unwrap_or(defaults.origins_path),
            default_origin: env::var(ORIGIN_ENV).unwrap_or(defaults.default_origin),
        }
    }

    pub fn with_products_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.products_path = path.into();
        self
    }

    pub fn with_origins_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.origins_path = path.into();
        self
    }

    /// Use persisted indexes instead of building them from the catalog
    pub fn with_index_paths(mut self, gin: impl Into<PathBuf>, aka: impl Into<PathBuf>) -> Self {
        self.gin_index_path = Some(gin.into());
        self.aka_index_path = Some(aka.into());
        self
    }

    pub fn with_default_origin(mut self, origin: &str) -> Self {
        self.default_origin = origin.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatasetConfig::default();
        assert_eq!(config.products_path, PathBuf::from("data/products.json"));
        assert_eq!(config.default_origin, "global");
        assert!(config.gin_index_path.is_none());
    }

    #[test]
    fn test_builders() {
        let config = DatasetConfig::default()
            .with_products_path("/tmp/p.json")
            .with_index_paths("/tmp/gin.json", "/tmp/aka.json")
            .with_default_origin("fr");
        assert_eq!(config.products_path, PathBuf::from("/tmp/p.json"));
        assert_eq!(config.aka_index_path, Some(PathBuf::from("/tmp/aka.json")));
        assert_eq!(config.default_origin, "fr");
    }
}
