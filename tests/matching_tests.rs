//! # Integration Tests
//!
//! Matching ingredient names against the bundled sample catalog.

use ghgi::catalog::Catalog;
use ghgi::gin::{tokenize, GinIndex};
use ghgi::ingredient_parser::parse_ingredient_line;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::path::Path;

fn sample_catalog() -> Catalog {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/products.json");
    Catalog::load(&path).unwrap()
}

fn stems(text: &str, stemmer: &Stemmer) -> HashSet<String> {
    tokenize(text)
        .iter()
        .filter(|t| t.as_str() != ",")
        .map(|t| stemmer.stem(t).into_owned())
        .collect()
}

#[test]
fn test_every_alias_matches_itself() {
    let index = GinIndex::build(&sample_catalog());
    assert!(!index.is_empty());
    for alias in index.aliases() {
        let found = index.match_name(alias).unwrap_or_else(|| panic!("'{}' should match", alias));
        assert_eq!(found.score, 1.0, "score of '{}'", alias);
        assert_eq!(Some(found.canonical.as_str()), index.canonical(alias), "canonical of '{}'", alias);
    }
}

#[test]
fn test_matches_are_query_subsets() {
    let index = GinIndex::build(&sample_catalog());
    let stemmer = Stemmer::create(Algorithm::English);
    let queries = vec![
        "russet potatoes",
        "dried wide egg noodles",
        "grape tomato halves",
        "fresh flat-leaf parsley",
        "extra-virgin olive oil for drizzling",
        "cannellini beans, rinsed",
        "coarse sea salt",
        "chicken stock",
    ];
    for query in queries {
        if let Some(found) = index.match_name(query) {
            let query_stems = stems(query, &stemmer);
            let alias_stems = stems(&found.alias, &stemmer);
            assert!(
                alias_stems.is_subset(&query_stems),
                "'{}' matched '{}', which is not a subset",
                query,
                found.alias
            );
        }
    }
}

#[test]
fn test_sample_matches() {
    let index = GinIndex::build(&sample_catalog());
    let cases = vec![
        ("navy bean", Some("white beans")),
        ("cherry tomato", Some("tomatoes")),
        ("flour", Some("wheat flour")),
        ("bay leaf", Some("bay leaves")),
        ("bay", Some("bay seasoning")),
        ("garbanzo bean or chickpea", Some("chickpeas")),
        ("italian tuna", Some("tuna")),
        ("white", None),
        ("potats", None),
        ("saffron", None),
    ];
    for (query, expected) in cases {
        let found = index.match_name(query);
        assert_eq!(found.as_ref().map(|m| m.canonical.as_str()), expected, "match of '{}'", query);
    }
}

#[test]
fn test_repeated_words_keep_score_in_range() {
    let index = GinIndex::build(&sample_catalog());
    for (query, expected) in [("potato potato", "potatoes"), ("flour flour", "wheat flour"), ("salt salt salt", "salt")] {
        let found = index.match_name(query).unwrap_or_else(|| panic!("'{}' should match", query));
        assert_eq!(found.canonical, expected, "match of '{}'", query);
        assert!(found.score > 0.0 && found.score <= 1.0, "score of '{}' is {}", query, found.score);
    }
}

#[test]
fn test_parsed_ingredients_match() {
    let index = GinIndex::build(&sample_catalog());
    let cases = vec![
        ("2 (6-ounce) cans Italian tuna in water or oil, drained", "tuna"),
        ("1 cup chickpeas", "chickpeas"),
        ("3 eggs, beaten", "eggs"),
        ("2 bunches parsley", "parsley"),
        ("1 pound meatloaf mix", "meatloaf mix"),
    ];
    for (line, expected) in cases {
        let outcome = parse_ingredient_line(line);
        let (product, confidence) = index
            .lookup(&outcome.ingredients()[0])
            .unwrap_or_else(|| panic!("'{}' should match a product", line));
        assert_eq!(product.name, expected, "product of '{}'", line);
        assert!(confidence > 0.0 && confidence <= 1.0);
    }
}
