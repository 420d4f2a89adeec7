//! # Fuzzy Matching Index
//!
//! A generalized inverted index (GIN) from word stems to the catalog aliases
//! containing them, tuned for matching refined ingredient names to products.
//!
//! ## Matching rules
//!
//! - A candidate alias matches only if every one of its own stems appears in
//!   the query; the query may carry extra words, the alias may not
//! - The last noun of the query is the keyword and must be part of the match;
//!   when that leaves nothing, the query is retried without a keyword
//! - A single color word ("white", "red") never matches on its own
//! - Queries naming alternatives ("grape or cherry tomatoes") are matched per
//!   alternative and the best alternative wins
//! - Candidates are scored with the Dice coefficient of matched stems; ties go
//!   to the longer alias, then the lexicographically smaller one
//!
//! ## Usage
//!
//! ```rust
//! use ghgi::catalog::{Catalog, CatalogEntry, Category};
//! use ghgi::gin::GinIndex;
//!
//! let catalog = Catalog::from_entries(vec![CatalogEntry::new("potatoes")
//!     .with_mass(213.0)
//!     .with_specific_gravity(0.75)
//!     .with_category(Category::Root, 1.0)
//!     .with_alias("sweet potato")])
//! .unwrap();
//!
//! let index = GinIndex::build(&catalog);
//! let found = index.match_name("sweet potato").unwrap();
//! assert_eq!(found.canonical, "potatoes");
//! assert_eq!(found.score, 1.0);
//! ```

use crate::catalog::Catalog;
use crate::errors::IndexError;
use crate::ingredient_model::{Ingredient, ProductRef};
use crate::tokenizer::tag_parts_of_speech;
use anyhow::Context;
use lazy_static::lazy_static;
use log::{debug, info, trace, warn};
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

lazy_static! {
    /// Words indexed as written
    static ref NO_STEM: HashSet<&'static str> = ["whiting"].into_iter().collect();

    /// Words that cannot be matched on their own
    static ref NO_SOLO: HashSet<&'static str> =
        ["black", "blue", "grey", "gray", "purple", "red", "white", "yellow"].into_iter().collect();

    /// Stems that, when present in a query, every candidate must also contain
    static ref MUST_MATCH: HashSet<&'static str> = ["leaf"].into_iter().collect();
}

/// A successful match of a query against the index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GinMatch {
    /// The alias that matched
    pub alias: String,
    /// Canonical catalog name of the alias
    pub canonical: String,
    /// Dice coefficient of matched stems, in (0, 1]
    pub score: f64,
    /// Word count of the alias
    pub match_size: usize,
    /// Distinct word stems in the query
    pub term_size: usize,
}

/// Alias index value as persisted: one canonical name, or a list whose first
/// entry is used
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AkaValue {
    One(String),
    Many(Vec<String>),
}

/// Split text into lowercase words, with commas as their own tokens
///
/// Letters, digits, hyphens and apostrophes form words; everything else
/// separates them.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '\'' {
            word.extend(ch.to_lowercase());
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if ch == ',' {
            tokens.push(",".to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

fn words(text: &str) -> Vec<String> {
    tokenize(text).into_iter().filter(|t| t != ",").collect()
}

/// Stem-to-alias inverted index with the alias-to-canonical map
pub struct GinIndex {
    index: BTreeMap<String, BTreeSet<String>>,
    aliases: HashMap<String, String>,
    alias_stems: HashMap<String, Vec<String>>,
    stemmer: Stemmer,
}

impl fmt::Debug for GinIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GinIndex")
            .field("stems", &self.index.len())
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

impl GinIndex {
    fn empty() -> Self {
        Self {
            index: BTreeMap::new(),
            aliases: HashMap::new(),
            alias_stems: HashMap::new(),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    fn stem(&self, word: &str) -> String {
        if NO_STEM.contains(word) {
            word.to_string()
        } else {
            self.stemmer.stem(word).into_owned()
        }
    }

    fn stem_all(&self, words: &[String]) -> Vec<String> {
        words.iter().map(|w| self.stem(w)).collect()
    }

    fn insert(&mut self, alias: &str, canonical: &str) {
        if let Some(existing) = self.aliases.get(alias) {
            if existing != canonical {
                warn!("Alias '{}' of '{}' already names '{}'", alias, canonical, existing);
            }
            return;
        }
        let stems = self.stem_all(&words(alias));
        for stem in &stems {
            self.index.entry(stem.clone()).or_default().insert(alias.to_string());
        }
        self.aliases.insert(alias.to_string(), canonical.to_string());
        self.alias_stems.insert(alias.to_string(), stems);
    }

    /// Index every canonical name and alias of the catalog
    pub fn build(catalog: &Catalog) -> Self {
        let mut gin = Self::empty();
        for entry in catalog.entries() {
            if entry.name.starts_with('_') {
                continue;
            }
            for alias in entry.all_names() {
                gin.insert(&alias.to_lowercase(), &entry.name);
            }
        }
        info!("Built matching index: {} stems, {} aliases", gin.index.len(), gin.aliases.len());
        gin
    }

    /// Assemble an index from its persisted parts
    pub fn from_parts(
        index: BTreeMap<String, Vec<String>>,
        aliases: HashMap<String, String>,
    ) -> Result<Self, IndexError> {
        let mut gin = Self::empty();
        for listed in index.values().flatten() {
            if !aliases.contains_key(listed) {
                return Err(IndexError::DanglingAlias(listed.clone()));
            }
        }
        gin.index = index.into_iter().map(|(stem, list)| (stem, list.into_iter().collect())).collect();
        gin.alias_stems = aliases.keys().map(|alias| (alias.clone(), gin.stem_all(&words(alias)))).collect();
        gin.aliases = aliases;
        Ok(gin)
    }

    /// Parse the persisted stem index and alias index documents
    pub fn from_json(gin_json: &str, aka_json: &str) -> Result<Self, IndexError> {
        let index: BTreeMap<String, Vec<String>> = serde_json::from_str(gin_json)?;
        let raw: BTreeMap<String, AkaValue> = serde_json::from_str(aka_json)?;
        let mut aliases = HashMap::with_capacity(raw.len());
        for (alias, value) in raw {
            let canonical = match value {
                AkaValue::One(name) => name,
                AkaValue::Many(names) => names
                    .into_iter()
                    .next()
                    .ok_or_else(|| IndexError::Format(format!("alias '{alias}' names no product")))?,
            };
            aliases.insert(alias, canonical);
        }
        Self::from_parts(index, aliases)
    }

    /// Load persisted indexes from disk
    pub fn load(gin_path: &Path, aka_path: &Path) -> anyhow::Result<Self> {
        let gin_json = fs::read_to_string(gin_path)
            .with_context(|| format!("Failed to read stem index {}", gin_path.display()))?;
        let aka_json = fs::read_to_string(aka_path)
            .with_context(|| format!("Failed to read alias index {}", aka_path.display()))?;
        let gin = Self::from_json(&gin_json, &aka_json).context("Failed to load matching index")?;
        info!("Loaded matching index: {} stems, {} aliases", gin.index.len(), gin.aliases.len());
        Ok(gin)
    }

    /// Persist both indexes as JSON: stems map to sorted alias arrays
    pub fn save(&self, gin_path: &Path, aka_path: &Path) -> anyhow::Result<()> {
        let aliases: BTreeMap<&String, &String> = self.aliases.iter().collect();
        fs::write(gin_path, serde_json::to_string(&self.index)?)
            .with_context(|| format!("Failed to write stem index {}", gin_path.display()))?;
        fs::write(aka_path, serde_json::to_string(&aliases)?)
            .with_context(|| format!("Failed to write alias index {}", aka_path.display()))?;
        Ok(())
    }

    /// Number of distinct stems
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Canonical catalog name of an alias
    pub fn canonical(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Every indexed alias, sorted
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.aliases.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    /// Match a candidate ingredient name
    ///
    /// # Returns
    ///
    /// The best matching alias with its canonical name and score, or `None`
    /// when no alias is a token subset of the query.
    pub fn match_name(&self, query: &str) -> Option<GinMatch> {
        let tokens = tokenize(query);
        if tokens.len() == 1 && NO_SOLO.contains(tokens[0].as_str()) {
            debug!("'{}' cannot be matched on its own", query);
            return None;
        }

        let found = if tokens.iter().any(|t| t == "or" || t == ",") {
            self.or_match(&tokens)
        } else {
            self.best_match(&tokens, true)
        };
        debug!(
            "Match '{}' -> {}",
            query,
            found
                .as_ref()
                .map_or("none".to_string(), |m| format!("'{}' ({}) {:.4}", m.alias, m.canonical, m.score))
        );
        found
    }

    /// Match each alternative separately; the highest score wins, then the
    /// larger alias, then the earlier alternative
    fn or_match(&self, tokens: &[String]) -> Option<GinMatch> {
        let mut best: Option<GinMatch> = None;
        for chunk in tokens.split(|t| t == "or" || t == ",").filter(|c| !c.is_empty()) {
            let Some(candidate) = self.best_match(chunk, true) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some(current) => {
                    candidate.score > current.score
                        || (candidate.score == current.score && candidate.match_size > current.match_size)
                }
            };
            if better {
                best = Some(candidate);
            }
        }
        best
    }

    fn best_match(&self, tokens: &[String], use_keyword: bool) -> Option<GinMatch> {
        let stems = self.stem_all(tokens);
        let keyword = if use_keyword {
            tag_parts_of_speech(tokens)
                .iter()
                .rposition(|pos| pos.is_noun())
                .map(|k| stems[k].as_str())
        } else {
            None
        };

        // Repeated words count once
        let mut distinct: Vec<&str> = Vec::with_capacity(stems.len());
        for stem in &stems {
            if !distinct.contains(&stem.as_str()) {
                distinct.push(stem);
            }
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        match keyword {
            Some(keyword) => {
                for alias in self.index.get(keyword).into_iter().flatten() {
                    counts.insert(alias, 1);
                }
                for stem in distinct.iter().filter(|stem| **stem != keyword) {
                    for alias in self.index.get(*stem).into_iter().flatten() {
                        if let Some(count) = counts.get_mut(alias.as_str()) {
                            *count += 1;
                        }
                    }
                }
            }
            None => {
                for stem in &distinct {
                    for alias in self.index.get(*stem).into_iter().flatten() {
                        *counts.entry(alias).or_insert(0) += 1;
                    }
                }
            }
        }

        let musts: Vec<&String> = stems.iter().filter(|s| MUST_MATCH.contains(s.as_str())).collect();
        counts.retain(|alias, _| {
            let Some(alias_stems) = self.alias_stems.get(*alias) else {
                return false;
            };
            alias_stems.iter().all(|s| stems.contains(s)) && musts.iter().all(|m| alias_stems.contains(m))
        });
        trace!("Candidates for {:?} (keyword {:?}): {:?}", tokens, keyword, counts);

        if counts.is_empty() {
            return if keyword.is_some() {
                self.best_match(tokens, false)
            } else {
                None
            };
        }

        let max_count = counts.values().copied().max().unwrap_or(0);
        let term_size = distinct.len();
        let mut selected: Option<(f64, &str, usize)> = None;
        for (alias, _) in counts.iter().filter(|(_, count)| **count == max_count) {
            let match_size = self.alias_stems.get(*alias).map_or(0, Vec::len);
            let score = (max_count * 2) as f64 / (match_size + term_size) as f64;
            let wins = match selected {
                None => true,
                Some((best_score, best_alias, _)) => {
                    score > best_score || (score == best_score && alias.len() > best_alias.len())
                }
            };
            if wins {
                selected = Some((score, *alias, match_size));
            }
        }

        let (score, alias, match_size) = selected?;
        let canonical = self.aliases.get(alias)?;
        Some(GinMatch {
            alias: alias.to_string(),
            canonical: canonical.clone(),
            score,
            match_size,
            term_size,
        })
    }

    /// Match every name of an ingredient; the best score wins, then the longer name
    ///
    /// Hyphens in names are read as spaces.
    pub fn lookup(&self, ingredient: &Ingredient) -> Option<(ProductRef, f64)> {
        let mut best: Option<(GinMatch, usize)> = None;
        for name in ingredient.names() {
            let name = name.replace('-', " ");
            let Some(found) = self.match_name(&name) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((current, size)) => {
                    found.score > current.score || (found.score == current.score && name.len() > *size)
                }
            };
            if better {
                best = Some((found, name.len()));
            }
        }

        best.map(|(found, _)| {
            (
                ProductRef {
                    name: found.canonical,
                    alias: found.alias,
                },
                found.score,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, Category};

    fn entry(name: &str, aliases: &[&str]) -> CatalogEntry {
        aliases.iter().fold(
            CatalogEntry::new(name)
                .with_mass(100.0)
                .with_specific_gravity(1.0)
                .with_category(Category::FruitVeg, 1.0),
            |entry, alias| entry.with_alias(alias),
        )
    }

    fn sample_index() -> GinIndex {
        let catalog = Catalog::from_entries(vec![
            entry("potatoes", &["potato", "sweet potato"]),
            entry("tomatoes", &["tomato", "cherry tomato", "cherry tomatoes"]),
            entry("grapes", &["grape"]),
            entry("noodles", &["wheat noodle", "egg noodle"]),
            entry("bay seasoning", &["bay"]),
            entry("white beans", &["white bean"]),
            entry("whiting", &[]),
        ])
        .unwrap();
        GinIndex::build(&catalog)
    }

    #[test]
    fn test_exact_aliases_score_one() {
        let gin = sample_index();
        for alias in gin.aliases() {
            let found = gin.match_name(alias).unwrap_or_else(|| panic!("'{}' should match", alias));
            assert_eq!(found.score, 1.0, "score of '{}'", alias);
        }
    }

    #[test]
    fn test_alias_resolves_to_canonical() {
        let gin = sample_index();
        let found = gin.match_name("sweet potato").unwrap();
        assert_eq!((found.alias.as_str(), found.canonical.as_str()), ("sweet potato", "potatoes"));

        let found = gin.match_name("potato").unwrap();
        assert_eq!(found.canonical, "potatoes");
        assert_eq!(found.alias, "potatoes");

        assert!(gin.match_name("potats").is_none());
    }

    #[test]
    fn test_partial_query_scores_dice() {
        let gin = sample_index();
        let found = gin.match_name("dried wide wheat noodle").unwrap();
        assert_eq!(found.alias, "wheat noodle");
        assert_eq!((found.match_size, found.term_size), (2, 4));
        assert!((found.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_words_count_once() {
        let gin = sample_index();
        let found = gin.match_name("potato potato").unwrap();
        assert_eq!(found.canonical, "potatoes");
        assert_eq!((found.match_size, found.term_size), (1, 1));
        assert_eq!(found.score, 1.0);

        let found = gin.match_name("wheat noodle noodle noodle").unwrap();
        assert_eq!(found.alias, "wheat noodle");
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_candidates_are_query_subsets() {
        let gin = sample_index();
        for query in ["egg", "cherry", "wide wheat"] {
            if let Some(found) = gin.match_name(query) {
                let query_words = words(query);
                for word in words(&found.alias) {
                    assert!(
                        query_words.iter().any(|q| gin.stem(q) == gin.stem(&word)),
                        "'{}' matched '{}' with extra word '{}'",
                        query,
                        found.alias,
                        word
                    );
                }
            }
        }
    }

    #[test]
    fn test_or_query_picks_best_alternative() {
        let gin = sample_index();
        let found = gin.match_name("grape or cherry tomatoes").unwrap();
        assert_eq!(found.canonical, "tomatoes");
        assert_eq!(found.score, 1.0);
        assert_eq!(found.match_size, 2);

        let found = gin.match_name("grape, potato").unwrap();
        assert_eq!(found.canonical, "grapes");
    }

    #[test]
    fn test_color_words_do_not_stand_alone() {
        let gin = sample_index();
        assert!(gin.match_name("white").is_none());
        assert_eq!(gin.match_name("white beans").unwrap().canonical, "white beans");
    }

    #[test]
    fn test_must_match_leaf() {
        let gin = sample_index();
        assert!(gin.match_name("bay leaf").is_none());
        assert_eq!(gin.match_name("bay").unwrap().canonical, "bay seasoning");
    }

    #[test]
    fn test_no_stem_words() {
        let gin = sample_index();
        assert_eq!(gin.stem("whiting"), "whiting");
        assert_eq!(gin.match_name("whiting").unwrap().canonical, "whiting");
    }

    #[test]
    fn test_lookup_prefers_best_name() {
        let gin = sample_index();
        let ingredient = Ingredient::new().with_name("grape").with_name("cherry tomato");
        let (product, confidence) = gin.lookup(&ingredient).unwrap();
        assert_eq!(product.name, "tomatoes");
        assert_eq!(product.alias, "cherry tomatoes");
        assert_eq!(confidence, 1.0);

        let hyphenated = Ingredient::new().with_name("sweet-potato");
        assert_eq!(gin.lookup(&hyphenated).unwrap().0.alias, "sweet potato");
        assert!(gin.lookup(&Ingredient::new().with_name("potats")).is_none());
    }

    #[test]
    fn test_persisted_round_trip_preserves_matches() {
        let gin = sample_index();
        let dir = tempfile::tempdir().unwrap();
        let (gin_path, aka_path) = (dir.path().join("gin.json"), dir.path().join("aka.json"));
        gin.save(&gin_path, &aka_path).unwrap();

        let loaded = GinIndex::load(&gin_path, &aka_path).unwrap();
        assert_eq!(loaded.len(), gin.len());
        assert_eq!(loaded.match_name("sweet potato"), gin.match_name("sweet potato"));
    }

    #[test]
    fn test_alias_lists_and_dangling_aliases() {
        let gin = GinIndex::from_json(r#"{"potato": ["potato"]}"#, r#"{"potato": ["potatoes"]}"#).unwrap();
        assert_eq!(gin.canonical("potato"), Some("potatoes"));

        let dangling = GinIndex::from_json(r#"{"potato": ["potato"]}"#, r#"{}"#);
        assert!(matches!(dangling, Err(IndexError::DanglingAlias(_))));
    }
}
