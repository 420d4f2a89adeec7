//! # Integration Tests
//!
//! Mass and footprint estimates through a repository loaded from the
//! bundled sample datasets, plus loading behaviour with datasets written to
//! temporary directories.

use ghgi::config::DatasetConfig;
use ghgi::gin::GinIndex;
use ghgi::repository::{Repository, RepositoryCache};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const EPSILON: f64 = 1e-6;

fn data_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

fn sample_config() -> DatasetConfig {
    DatasetConfig::default()
        .with_products_path(data_path("products.json"))
        .with_origins_path(data_path("origins.json"))
}

fn sample_repository() -> Repository {
    Repository::load(&sample_config()).unwrap()
}

fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!((actual - expected).abs() < EPSILON, "{}: expected {}, got {}", what, expected, actual);
}

#[test]
fn test_line_estimates() {
    let repository = sample_repository();
    // (line, product, grams, grams CO2e at the mean factor)
    let cases = vec![
        ("2 (6-ounce) cans Italian tuna in water or oil, drained", "tuna", 340.194, 2075.18),
        ("1 cup flour", "wheat flour", 130.1234, 208.2),
        ("3 eggs, beaten", "eggs", 150.0, 705.0),
        ("2 bunches parsley", "parsley", 120.0, 180.0),
        ("1 bunch cilantro", "cilantro", 40.0, 60.0),
        ("1 pound meatloaf mix", "meatloaf mix", 453.592, 15240.69),
    ];
    for (line, product, grams, impact) in cases {
        let estimates = repository.estimate_line(line, None).unwrap();
        assert_eq!(estimates.len(), 1, "'{}' should yield one estimate", line);
        let estimate = &estimates[0];
        assert_eq!(estimate.product.as_deref(), Some(product), "product of '{}'", line);
        assert_close(estimate.mass_g, grams, line);
        assert_close(estimate.impact.unwrap_or(f64::NAN), impact, line);
    }
}

#[test]
fn test_origin_selection() {
    let repository = sample_repository();
    let global = repository.estimate_line("1 pound meatloaf mix", Some("global")).unwrap();
    let france = repository.estimate_line("1 pound meatloaf mix", Some("fr")).unwrap();
    assert_close(global[0].impact.unwrap_or(f64::NAN), 15240.69, "global");
    assert_close(france[0].impact.unwrap_or(f64::NAN), 9570.79, "fr");

    assert!(repository.estimate_line("1 pound meatloaf mix", Some("mars")).is_err());
}

#[test]
fn test_unmatched_and_zero_factor() {
    let repository = sample_repository();

    let saffron = repository.estimate_line("1 pinch saffron", None).unwrap();
    assert!(saffron[0].product.is_none());
    assert_close(saffron[0].mass_g, 0.308, "placeholder volume");
    assert_eq!(saffron[0].impact, Some(0.0));

    let water = repository.estimate_line("1 cup water", None).unwrap();
    assert_eq!(water[0].product.as_deref(), Some("water"));
    assert_eq!(water[0].impact, None);
}

#[test]
fn test_recipe_estimate_json() {
    let repository = sample_repository();
    let recipe = "Ingredients:\n1 cup flour\nEquipment:\n1 whisk\nFor the topping:\n1/2 cup grated parmesan";
    let estimates = repository.estimate_recipe(recipe, None).unwrap();
    assert_eq!(estimates.len(), 2);
    assert_eq!(estimates[1].product.as_deref(), Some("cheese"));
    assert_close(estimates[1].mass_g, 0.5 * 236.588 * 0.6 / 2.0, "grated parmesan");

    let json = serde_json::to_value(&estimates[0]).unwrap();
    assert_eq!(json["names"][0], "flour");
    assert_eq!(json["qtys"][0]["unit"], "cup");
    assert_eq!(json["product"], "wheat flour");
    assert_eq!(json["alias"], "flour");
    assert_eq!(json["efficiency_ratio"], 1.0);
}

#[test]
fn test_efficiency_ratios() {
    let repository = sample_repository();
    let ratio = |line: &str, origin: Option<&str>| repository.estimate_line(line, origin).unwrap()[0].efficiency_ratio;

    // Best energy density per emission among the grains
    assert_eq!(ratio("1 cup flour", None), Some(1.0));
    assert_close(ratio("1 can tuna", None).unwrap_or(f64::NAN), 0.175644028103, "tuna");

    // Composed from beef and pork by share
    assert_close(ratio("1 pound meatloaf mix", None).unwrap_or(f64::NAN), 0.089642857143, "meatloaf mix");
    assert_close(ratio("1 pound meatloaf mix", Some("fr")).unwrap_or(f64::NAN), 0.096275510204, "meatloaf mix fr");

    // Milk is alone in its category and water has no emission factor
    assert_eq!(ratio("1 cup milk", None), None);
    assert_eq!(ratio("1 cup water", None), None);
}

#[test]
fn test_baselines_cover_every_origin() {
    let repository = sample_repository();
    for origin in ["global", "fr", "us"] {
        let baselines = repository.baselines().for_origin(origin).unwrap();
        assert!(!baselines.is_empty(), "baselines of '{}'", origin);
    }
    let json = serde_json::to_value(repository.baselines()).unwrap();
    assert_eq!(json["global"]["m"], serde_json::Value::Null);
    assert_close(json["global"]["pd"].as_f64().unwrap_or(f64::NAN), 0.21 / 0.9, "pd baseline");
}

#[test]
fn test_load_persisted_index() {
    let dir = TempDir::new().unwrap();
    let gin_path = dir.path().join("gin.json");
    let aka_path = dir.path().join("aka.json");

    let built = sample_repository();
    built.gin().save(&gin_path, &aka_path).unwrap();

    let config = sample_config().with_index_paths(&gin_path, &aka_path);
    let loaded = Repository::load(&config).unwrap();
    assert_eq!(loaded.gin().len(), built.gin().len());
    assert_eq!(loaded.match_name("navy beans"), built.match_name("navy beans"));

    let reloaded = GinIndex::load(&gin_path, &aka_path).unwrap();
    assert_eq!(reloaded.aliases(), built.gin().aliases());
}

#[test]
fn test_load_rejects_bad_catalog() {
    let dir = TempDir::new().unwrap();
    let products = dir.path().join("products.json");
    fs::write(&products, r#"{"mystery": {"g": 10}, "orphan": {"super": {"nothing": 100}}}"#).unwrap();

    let config = sample_config().with_products_path(&products);
    let err = Repository::load(&config).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("mystery: no sg value found"), "{}", message);
    assert!(message.contains("orphan: unknown parent 'nothing'"), "{}", message);
}

#[test]
fn test_load_with_one_index_path_fails() {
    let mut config = sample_config();
    config.gin_index_path = Some(PathBuf::from("gin.json"));
    assert!(Repository::load(&config).is_err());
}

#[test]
fn test_unknown_default_origin_falls_back() {
    let config = sample_config().with_default_origin("atlantis");
    let repository = Repository::load(&config).unwrap();
    assert_eq!(repository.default_origin(), "global");

    let config = sample_config().with_default_origin("fr");
    assert_eq!(Repository::load(&config).unwrap().default_origin(), "fr");
}

#[test]
fn test_cache_loads_once() {
    let cache = RepositoryCache::new();
    let first = cache.get_or_load(&sample_config()).unwrap();
    let second = cache.get_or_load(&DatasetConfig::default().with_products_path("/nonexistent.json")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    cache.clear();
    assert!(!cache.is_loaded());
}
