//! # Ingredient and Amount Data Model
//!
//! This module defines the values that flow through the parsing pipeline:
//! tagged tokens, amount trees, ingredients and the output records they
//! serialize to.
//!
//! ## Core Concepts
//!
//! - **Token**: a word with its part of speech and semantic tag
//! - **Amount**: a quantity/unit pair with qualifier, alternate and plus children
//! - **Node**: one element of a tagged stream, either a word or an amount
//! - **Ingredient**: amounts, a refined name and its preparation modifiers
//!
//! ## Usage
//!
//! ```rust
//! use ghgi::ingredient_model::{Amount, Ingredient};
//! use ghgi::measurement_types::UnitId;
//!
//! let tuna = Ingredient::new()
//!     .with_amount(
//!         Amount::new(2.0, UnitId::Pkg)
//!             .with_qualifier(Amount::new(6.0, UnitId::Ounce).per_each()),
//!     )
//!     .with_name("italian tuna")
//!     .with_mod("drained");
//!
//! assert_eq!(tuna.names(), vec!["italian tuna".to_string()]);
//! ```

use crate::measurement_types::{canonical, UnitId};
use crate::text_processing::{parse_number, ParsedNumber};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Part-of-speech labels assigned by the tagger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    Noun,
    ProperNoun,
    Verb,
    PastParticiple,
    Gerund,
    Adjective,
    Adverb,
    Preposition,
    Determiner,
    Conjunction,
    Pronoun,
    /// The word "to"
    To,
    Number,
    Punctuation,
}

impl PartOfSpeech {
    pub fn is_noun(&self) -> bool {
        matches!(self, PartOfSpeech::Noun | PartOfSpeech::ProperNoun)
    }

    /// Labels that open a modifier phrase rather than continue a name
    pub fn is_distractor(&self) -> bool {
        matches!(
            self,
            PartOfSpeech::PastParticiple | PartOfSpeech::Preposition | PartOfSpeech::Determiner
        )
    }
}

/// Semantic role of a token within an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticTag {
    Quantity,
    Unit,
    /// A quantity with a trailing dash ("4-") qualifying an each-count
    EaQuantity,
    /// A unit clarified per item ("pounds each")
    EaUnit,
    AltQuantity,
    AltUnit,
    PlusAmount,
    Plain,
}

/// A single tagged word
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub pos: PartOfSpeech,
    pub tag: SemanticTag,
}

impl Token {
    pub fn new(text: &str, pos: PartOfSpeech) -> Self {
        Self {
            text: text.to_string(),
            pos,
            tag: SemanticTag::Plain,
        }
    }

    pub fn with_tag(mut self, tag: SemanticTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }

    /// Whether the token is the given word, ignoring case
    pub fn is_word(&self, word: &str) -> bool {
        self.text.eq_ignore_ascii_case(word)
    }

    pub fn is_punctuation(&self) -> bool {
        self.pos == PartOfSpeech::Punctuation
    }

    pub fn is_quantity(&self) -> bool {
        matches!(self.tag, SemanticTag::Quantity | SemanticTag::EaQuantity)
    }

    pub fn is_unit(&self) -> bool {
        self.tag == SemanticTag::Unit
    }

    /// Numeric value of a quantity token
    pub fn number(&self) -> Option<ParsedNumber> {
        parse_number(&self.text)
    }

    /// Canonical unit of a unit token
    pub fn unit(&self) -> Option<UnitId> {
        canonical(&self.text)
    }
}

/// A quantity/unit pair, possibly carrying qualifier, alternate and plus children
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    pub quantity: f64,
    pub unit: UnitId,
    /// Clarifying amounts for a count ("2 (6-ounce) cans")
    pub qualifiers: Vec<Amount>,
    /// The quantity applies to each counted item ("1 pound each")
    pub per_each: bool,
    /// The amount is added to the one before it ("plus 2 tablespoons")
    pub is_plus: bool,
    /// Other measurements of the same physical quantity ("1 cup / 240 ml")
    pub alternates: Vec<Amount>,
    pub plus: Option<Box<Amount>>,
    /// Source tokens, retagged with the role they ended up playing
    pub tokens: Vec<Token>,
}

impl Amount {
    pub fn new(quantity: f64, unit: UnitId) -> Self {
        Self {
            quantity,
            unit,
            qualifiers: Vec::new(),
            per_each: false,
            is_plus: false,
            alternates: Vec::new(),
            plus: None,
            tokens: Vec::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: Amount) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn with_alternate(mut self, alternate: Amount) -> Self {
        self.alternates.push(alternate);
        self
    }

    pub fn with_plus(mut self, mut addition: Amount) -> Self {
        addition.is_plus = true;
        self.tail_mut().plus = Some(Box::new(addition));
        self
    }

    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Mark the amount as applying to each counted item
    pub fn per_each(mut self) -> Self {
        self.per_each = true;
        self
    }

    /// The last amount of the plus chain, where new alternates attach
    pub fn tail_mut(&mut self) -> &mut Amount {
        match self.plus {
            Some(ref mut next) => next.tail_mut(),
            None => self,
        }
    }

    /// Overwrite the semantic tag of every quantity and unit source token
    pub fn retag(&mut self, quantity_tag: SemanticTag, unit_tag: SemanticTag) {
        for token in &mut self.tokens {
            match token.tag {
                SemanticTag::Quantity | SemanticTag::EaQuantity | SemanticTag::AltQuantity => {
                    token.tag = quantity_tag
                }
                SemanticTag::Unit | SemanticTag::EaUnit | SemanticTag::AltUnit => token.tag = unit_tag,
                _ => {}
            }
        }
    }

    /// Flatten the tree into output order: the amount, its alternates, then
    /// the plus chain. Flattened amounts carry no children besides qualifiers.
    pub fn flatten(&self) -> Vec<Amount> {
        let mut out = Vec::new();
        self.flatten_into(&mut out, self.is_plus);
        out
    }

    fn flatten_into(&self, out: &mut Vec<Amount>, is_plus: bool) {
        out.push(Amount {
            quantity: self.quantity,
            unit: self.unit,
            qualifiers: self.qualifiers.clone(),
            per_each: self.per_each,
            is_plus,
            alternates: Vec::new(),
            plus: None,
            tokens: self.tokens.clone(),
        });
        for alternate in &self.alternates {
            alternate.flatten_into(out, false);
        }
        if let Some(next) = &self.plus {
            next.flatten_into(out, true);
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.unit)?;
        if self.per_each {
            write!(f, " each")?;
        }
        if !self.qualifiers.is_empty() {
            let inner: Vec<String> = self.qualifiers.iter().map(|q| q.to_string()).collect();
            write!(f, " ({})", inner.join(", "))?;
        }
        for alternate in &self.alternates {
            write!(f, " / {}", alternate)?;
        }
        if let Some(next) = &self.plus {
            write!(f, " plus {}", next)?;
        }
        Ok(())
    }
}

/// One element of a tagged stream
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Word(Token),
    Amount(Amount),
    /// An amount built from an `EaQuantity` that still needs an each-count to attach to
    Qualifier(Amount),
}

impl Node {
    pub fn as_word(&self) -> Option<&Token> {
        match self {
            Node::Word(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_amount(&self) -> bool {
        matches!(self, Node::Amount(_))
    }

    /// Whether this is a word node for `word`, ignoring case
    pub fn is_word(&self, word: &str) -> bool {
        self.as_word().is_some_and(|t| t.is_word(word))
    }
}

/// The catalog entry an ingredient matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Canonical catalog name
    pub name: String,
    /// The alias that matched
    pub alias: String,
}

/// Separators between alternative name phrases in `name_tokens`
const NAME_SEPARATORS: &[&str] = &[",", "or", "/"];

/// A parsed ingredient mention
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ingredient {
    pub amounts: Vec<Amount>,
    /// Refined, lowercased name words; phrases are separated by "," or "or"
    pub name_tokens: Vec<String>,
    pub mods: Vec<String>,
    pub stripped_words: Vec<String>,
    pub product: Option<ProductRef>,
    pub match_confidence: f64,
}

impl Ingredient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amounts.push(amount);
        self
    }

    /// Append a name phrase, separating it from any previous one
    pub fn with_name(mut self, name: &str) -> Self {
        if !self.name_tokens.is_empty() {
            self.name_tokens.push(",".to_string());
        }
        self.name_tokens
            .extend(name.split_whitespace().map(|w| w.to_lowercase()));
        self
    }

    pub fn with_mod(mut self, modifier: &str) -> Self {
        self.mods.push(modifier.to_string());
        self
    }

    pub fn with_product(mut self, product: ProductRef, confidence: f64) -> Self {
        self.product = Some(product);
        self.match_confidence = confidence;
        self
    }

    /// Candidate name phrases in order
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut phrase: Vec<&str> = Vec::new();
        for token in &self.name_tokens {
            if NAME_SEPARATORS.contains(&token.as_str()) {
                if !phrase.is_empty() {
                    names.push(phrase.join(" "));
                    phrase.clear();
                }
            } else {
                phrase.push(token);
            }
        }
        if !phrase.is_empty() {
            names.push(phrase.join(" "));
        }
        names
    }

    /// Every amount in output order
    pub fn flat_amounts(&self) -> Vec<Amount> {
        self.amounts.iter().flat_map(Amount::flatten).collect()
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.mods.iter().any(|m| m == modifier)
    }

    pub fn to_record(&self) -> IngredientRecord {
        IngredientRecord {
            qtys: self.flat_amounts().iter().map(QtyRecord::from).collect(),
            names: self.names(),
            mods: self.mods.clone(),
            stripped_words: self.stripped_words.clone(),
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amounts: Vec<String> = self.amounts.iter().map(|a| a.to_string()).collect();
        write!(f, "{} {}", amounts.join(" + "), self.names().join(" | "))?;
        if !self.mods.is_empty() {
            write!(f, " [{}]", self.mods.join(", "))?;
        }
        Ok(())
    }
}

/// One serialized quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QtyRecord {
    pub qty: f64,
    pub unit: String,
    pub per: Option<String>,
    pub plus: bool,
    pub qualifiers: Vec<QtyRecord>,
}

impl From<&Amount> for QtyRecord {
    fn from(amount: &Amount) -> Self {
        Self {
            qty: amount.quantity,
            unit: amount.unit.canonical_name().to_string(),
            per: amount.per_each.then(|| "each".to_string()),
            plus: amount.is_plus,
            qualifiers: amount.qualifiers.iter().map(QtyRecord::from).collect(),
        }
    }
}

/// The serialized form of a parsed ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRecord {
    pub qtys: Vec<QtyRecord>,
    pub names: Vec<String>,
    pub mods: Vec<String>,
    pub stripped_words: Vec<String>,
}

/// Disregard flags reported for a skipped line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisregardSignal {
    /// The line is a section header
    pub sustain: bool,
    /// The header opens an ingredient section
    pub unsustain: bool,
}

impl DisregardSignal {
    /// Whether lines after this one should be disregarded, given the current state
    pub fn disregard_following(&self, current: bool) -> bool {
        if self.unsustain {
            false
        } else if self.sustain {
            true
        } else {
            current
        }
    }
}

/// Result of parsing one line
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Vec<Ingredient>),
    Disregarded(DisregardSignal),
}

impl ParseOutcome {
    pub fn ingredients(&self) -> &[Ingredient] {
        match self {
            ParseOutcome::Parsed(ingredients) => ingredients,
            ParseOutcome::Disregarded(_) => &[],
        }
    }

    pub fn is_disregarded(&self) -> bool {
        matches!(self, ParseOutcome::Disregarded(_))
    }
}

/// A whole ingredient list parsed line by line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecipeParse {
    pub ingredients: Vec<Ingredient>,
    /// Lines skipped as headers, blanks or non-ingredient sections
    pub disregarded_lines: Vec<String>,
}

impl RecipeParse {
    pub fn parsed_count(&self) -> usize {
        self.ingredients.len()
    }

    pub fn disregarded_count(&self) -> usize {
        self.disregarded_lines.len()
    }
}

impl fmt::Display for RecipeParse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingredients ({}):", self.parsed_count())?;
        for ingredient in &self.ingredients {
            writeln!(f, "  - {}", ingredient)?;
        }
        if !self.disregarded_lines.is_empty() {
            writeln!(f, "Disregarded ({}):", self.disregarded_count())?;
            for line in &self.disregarded_lines {
                writeln!(f, "  - {}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_flatten_order() {
        let amount = Amount::new(1.25, UnitId::Cup)
            .with_alternate(Amount::new(80.0, UnitId::G))
            .with_plus(Amount::new(2.0, UnitId::Teaspoon).with_alternate(Amount::new(5.0, UnitId::G)));

        let flat = amount.flatten();
        let shape: Vec<(f64, UnitId, bool)> = flat.iter().map(|a| (a.quantity, a.unit, a.is_plus)).collect();
        assert_eq!(
            shape,
            vec![
                (1.25, UnitId::Cup, false),
                (80.0, UnitId::G, false),
                (2.0, UnitId::Teaspoon, true),
                (5.0, UnitId::G, false),
            ]
        );
    }

    #[test]
    fn test_plus_chain_tail() {
        let mut amount = Amount::new(1.0, UnitId::Cup).with_plus(Amount::new(2.0, UnitId::Tablespoon));
        amount.tail_mut().alternates.push(Amount::new(30.0, UnitId::Ml));
        let plus = amount.plus.as_ref().unwrap();
        assert_eq!(plus.alternates.len(), 1);
        assert!(plus.is_plus);
    }

    #[test]
    fn test_qty_record() {
        let amount = Amount::new(2.0, UnitId::Pkg).with_qualifier(Amount::new(6.0, UnitId::Ounce).per_each());
        let record = QtyRecord::from(&amount);
        assert_eq!(record.unit, "pkg");
        assert_eq!(record.per, None);
        assert_eq!(record.qualifiers[0].unit, "ounce");
        assert_eq!(record.qualifiers[0].per.as_deref(), Some("each"));
    }

    #[test]
    fn test_names_split_on_separators() {
        let ingredient = Ingredient {
            name_tokens: ["salmon", "or", "whole", "fish", ",", "trout"].iter().map(|s| s.to_string()).collect(),
            ..Ingredient::default()
        };
        assert_eq!(ingredient.names(), vec!["salmon", "whole fish", "trout"]);
    }

    #[test]
    fn test_record_serialization() {
        let ingredient = Ingredient::new()
            .with_amount(Amount::new(1.0, UnitId::Cup))
            .with_name("flour");
        let json = serde_json::to_value(ingredient.to_record()).unwrap();
        assert_eq!(json["qtys"][0]["qty"], 1.0);
        assert_eq!(json["qtys"][0]["unit"], "cup");
        assert_eq!(json["qtys"][0]["per"], serde_json::Value::Null);
        assert_eq!(json["names"][0], "flour");
    }

    #[test]
    fn test_disregard_signal() {
        let equipment = DisregardSignal { sustain: true, unsustain: false };
        let filling = DisregardSignal { sustain: true, unsustain: true };
        let blank = DisregardSignal::default();
        assert!(equipment.disregard_following(false));
        assert!(!filling.disregard_following(true));
        assert!(blank.disregard_following(true));
        assert!(!blank.disregard_following(false));
    }

    #[test]
    fn test_display() {
        let amount = Amount::new(2.0, UnitId::Pkg).with_qualifier(Amount::new(6.0, UnitId::Ounce).per_each());
        assert_eq!(amount.to_string(), "2 pkg (6 ounce each)");
    }
}
