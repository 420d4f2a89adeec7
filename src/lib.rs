//! # GHG Ingredient Impact
//!
//! Parses free-form recipe ingredient lines into quantities and names,
//! matches the names against a food catalog, resolves each ingredient to a
//! mass in grams and estimates its greenhouse-gas footprint.
//!
//! ## Pipeline
//!
//! - [`ingredient_parser`] turns a line into [`ingredient_model::Ingredient`]s
//! - [`gin`] matches an ingredient name to a catalog product
//! - [`mass`] converts the ingredient's amounts into grams of that product
//! - [`impact`] multiplies the mass by the product's emission factor
//!
//! [`repository::Repository`] bundles the datasets these stages read and
//! runs the whole chain for a line.

pub mod amount_tagger;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod gin;
pub mod impact;
pub mod ingredient_model;
pub mod ingredient_parser;
pub mod mass;
pub mod measurement_patterns;
pub mod measurement_types;
pub mod name_refiner;
pub mod repository;
pub mod segmenter;
pub mod text_processing;
pub mod tokenizer;
